use std::fmt::Formatter;

#[derive(Debug, PartialEq)]
pub enum PixgrabError {
    NetworkError(String),
    ErrorStatusCode {
        status_code: String,
        url: String,
    },
    /// Parameters are the request url, additional error message
    InvalidResponseBody {
        url: String,
        message: String,
    },
    /// Parameters are file path, additional error message
    FileOperationError {
        file_name: String,
        message: String,
    },
}

impl std::fmt::Display for PixgrabError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            PixgrabError::NetworkError(err) => format!("error connecting to internet. {err}"),
            PixgrabError::ErrorStatusCode { status_code, url } => {
                format!("server returned an error response. {url} => {status_code}")
            }
            PixgrabError::InvalidResponseBody { url, message } => {
                format!("error parsing search response from {url}. {message}")
            }
            PixgrabError::FileOperationError { file_name, message } => {
                format!("{message} : {file_name}")
            }
        };
        write!(f, "{str}")
    }
}

impl std::error::Error for PixgrabError {}
