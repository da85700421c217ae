use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "ssm_parameter_info",
    about = "AWS SSM Parameter Info - Retrieve one, many or all AWS SSM Parameters, optionally with their values."
)]
pub struct Opt {
    /// AWS Region
    #[structopt(short = "r", long = "region", default_value = "us-east-1", env = "AWS_REGION")]
    pub region: String,
    /// Parameter Name
    #[structopt(short = "n", long = "name")]
    pub name: Option<String>,
    /// Parameter Names, fetched in the order the store returns them
    #[structopt(short = "N", long = "names", min_values = 1)]
    pub names: Option<Vec<String>>,
    /// Include Parameter Values in the output
    #[structopt(short = "v", long = "return-values")]
    pub return_values: bool,
    /// Decrypt SecureString Values
    #[structopt(short = "d", long = "decrypt")]
    pub decrypt: bool,
    /// Read name / names / return_values from a JSON args file
    #[structopt(short = "a", long = "args-file", parse(from_os_str),
        conflicts_with_all = &["name", "names", "return_values"])]
    pub args_file: Option<PathBuf>,
    /// Page size when listing every parameter (1-50)
    #[structopt(long = "page-size")]
    pub page_size: Option<i64>,
    /// Retries for throttled calls
    #[structopt(long = "max-retries", default_value = "10")]
    pub max_retries: u32,
    /// Quiet Mode => Only Errors and Parameter Output
    #[structopt(short = "q", long = "quiet")]
    pub quiet: bool,
    /// Debug logging on stderr
    #[structopt(long = "verbose", conflicts_with = "quiet")]
    pub verbose: bool,
}
