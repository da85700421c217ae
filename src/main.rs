#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate failure_derive;

use std::process;

use failure::Fail;
use structopt::StructOpt;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::*;
use errors::ResolveError;
use resolver::resolve;
use retry::RetryPolicy;
use ssm_ops::SSMOps;
use ssm_parameters::*;

mod args;
mod errors;
mod resolver;
mod retry;
mod ssm_ops;
mod ssm_parameters;

#[derive(Serialize)]
struct Output<'a> {
    parameters: &'a [SSMParameter],
}

/// AWS SSM Parameter Info
/// Command Line
/// --region, -r => Region to query
/// --name, -n NAME => one parameter
/// --names, -N NAME... => several parameters
/// (neither) => every parameter visible to the caller
/// --return-values, -v => keep values in the output
/// --decrypt, -d => decrypt SecureString values
/// --args-file, -a FILE => take name / names / return_values from JSON
/// --quiet, -q / --verbose => log level, SSM_INFO_LOG overrides both
fn main() {
    let options = Opt::from_args();
    init_logging(&options);

    let outcome = run(&options).and_then(|parameters| {
        serde_json::to_string_pretty(&Output { parameters: &parameters })
            .map_err(|cause| ResolveError::Output { cause })
    });

    match outcome {
        Ok(json) => println!("{}", json),
        Err(err) => {
            eprintln!("error: {}", err);
            for cause in (&err as &dyn Fail).iter_causes() {
                eprintln!("  caused by: {}", cause);
            }
            process::exit(1)
        }
    }
}

fn init_logging(options: &Opt) {
    let filter = EnvFilter::try_from_env("SSM_INFO_LOG").unwrap_or_else(|_| {
        if options.verbose {
            EnvFilter::new("ssm_parameter_info=debug")
        } else if options.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::new("ssm_parameter_info=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .init();
}

fn run(options: &Opt) -> Result<Vec<SSMParameter>, ResolveError> {
    let request = build_request(options)?;
    debug!(request = ?request, "validated request");
    let ssm = SSMOps::new(&options.region, RetryPolicy::default().with_max_retries(options.max_retries));
    resolve(&request, &ssm)
}

fn build_request(options: &Opt) -> Result<ResolveRequest, ResolveError> {
    let args = match &options.args_file {
        Some(path) => RequestArgs::from_json_file(path)?,
        None => RequestArgs {
            name: options.name.clone(),
            names: options.names.clone(),
            return_values: Some(options.return_values),
        },
    };
    ResolveRequest::new(args)?
        .with_decryption(options.decrypt)
        .with_page_size(options.page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn opt(args: &[&str]) -> Opt {
        let mut argv = vec!["ssm_parameter_info"];
        argv.extend_from_slice(args);
        Opt::from_iter_safe(argv).unwrap()
    }

    #[test]
    fn flags_become_a_request() {
        let req = build_request(&opt(&["--name", "Hello", "--return-values", "--decrypt"])).unwrap();
        assert_eq!(req.mode, RequestMode::Single("Hello".to_string()));
        assert!(req.return_values);
        assert!(req.with_decryption);
    }

    #[test]
    fn name_and_names_is_a_config_error() {
        match build_request(&opt(&["--name", "Hello", "--names", "a", "b"])) {
            Err(ResolveError::Config { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn args_file_becomes_a_request() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"return_values": true}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let req = build_request(&opt(&["--args-file", &path, "--page-size", "10"])).unwrap();
        assert_eq!(req.mode, RequestMode::Catalog);
        assert!(req.return_values);
        assert_eq!(req.page_size, Some(10));
    }

    #[test]
    fn output_wraps_parameters() {
        let parameters = vec![SSMParameter { name: "Hello".into(), version: Some(1), ..Default::default() }];
        let json = serde_json::to_value(&Output { parameters: &parameters }).unwrap();
        assert_eq!(json, serde_json::json!({"parameters": [{"Name": "Hello", "Version": 1}]}));
    }
}
