use tracing::{debug, info, warn};

use crate::errors::ResolveError;
use crate::ssm_ops::{ParameterCatalog, MAX_NAMES_PER_CALL};
use crate::ssm_parameters::{RequestMode, ResolveRequest, SSMParameter};

/// Runs one lookup against `catalog`.
///
/// Exactly one strategy runs, picked by `request.mode`. Every returned record
/// carries a value only when `request.return_values` is set.
pub fn resolve<C>(request: &ResolveRequest, catalog: &C) -> Result<Vec<SSMParameter>, ResolveError>
where
    C: ParameterCatalog + ?Sized,
{
    match &request.mode {
        RequestMode::Single(name) => {
            info!(name = %name, "resolving single parameter");
            resolve_single(name, request, catalog).map(|p| vec![p])
        }
        RequestMode::Batch(names) => {
            info!(count = names.len(), "resolving parameter batch");
            resolve_batch(names, request, catalog)
        }
        RequestMode::Catalog => {
            info!(return_values = request.return_values, "listing parameter catalog");
            resolve_catalog(request, catalog)
        }
    }
}

fn resolve_single<C>(name: &str, request: &ResolveRequest, catalog: &C) -> Result<SSMParameter, ResolveError>
where
    C: ParameterCatalog + ?Sized,
{
    let result = catalog.get_parameters(&[name.to_string()], request.with_decryption)?;
    if result.invalid_parameters.iter().any(|n| n == name) {
        return Err(ResolveError::NotFound { name: name.to_string() });
    }
    result
        .parameters
        .into_iter()
        .next()
        .map(|p| p.keep_value(request.return_values))
        .ok_or_else(|| ResolveError::NotFound { name: name.to_string() })
}

// Names the store does not know are left out; the rest still come back.
fn resolve_batch<C>(
    names: &[String],
    request: &ResolveRequest,
    catalog: &C,
) -> Result<Vec<SSMParameter>, ResolveError>
where
    C: ParameterCatalog + ?Sized,
{
    let mut out_parms = Vec::with_capacity(names.len());
    for chunk in names.chunks(MAX_NAMES_PER_CALL) {
        let result = catalog.get_parameters(chunk, request.with_decryption)?;
        if !result.invalid_parameters.is_empty() {
            warn!(invalid = ?result.invalid_parameters, "skipping unknown parameters");
        }
        out_parms.extend(
            result
                .parameters
                .into_iter()
                .map(|p| p.keep_value(request.return_values)),
        );
    }
    Ok(out_parms)
}

fn resolve_catalog<C>(request: &ResolveRequest, catalog: &C) -> Result<Vec<SSMParameter>, ResolveError>
where
    C: ParameterCatalog + ?Sized,
{
    let mut listed: Vec<SSMParameter> = Vec::new();
    let mut next_token: Option<String> = None;
    loop {
        let page = catalog.describe_parameters(next_token.take(), request.page_size)?;
        debug!(count = page.parameters.len(), more = page.next_token.is_some(), "listed page");
        listed.extend(page.parameters);
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    if !request.return_values {
        return Ok(listed.into_iter().map(|p| p.keep_value(false)).collect());
    }

    for parameter in listed.iter_mut() {
        let fetched = catalog
            .get_parameters(&[parameter.name.clone()], request.with_decryption)?
            .parameters
            .into_iter()
            .next();
        match fetched {
            Some(fetched) => parameter.merge_fetched(fetched),
            None => warn!(name = %parameter.name, "parameter disappeared before its value was fetched"),
        }
    }
    Ok(listed)
}
