//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable ({}) is not set", crate::host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the `params` directory under the software root.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    let mut path = crate::host::get_sw_root().map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    let params_str = read_to_string(path).map_err(LoadError::FileLoadError)?;

    parse(&params_str)
}

/// Parse parameters from a TOML string
pub fn parse<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    struct TestParams {
        endpoint: String,
        timeout_ms: u64,
    }

    #[test]
    fn test_parse() {
        let p: TestParams = parse("endpoint = \"tcp://localhost:5020\"\ntimeout_ms = 100").unwrap();
        assert_eq!(p.endpoint, "tcp://localhost:5020");
        assert_eq!(p.timeout_ms, 100);

        assert!(matches!(
            parse::<TestParams>("endpoint = 4"),
            Err(LoadError::DeserialiseError(_))
        ));
    }
}
