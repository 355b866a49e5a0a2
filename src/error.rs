use wasm_bindgen::JsValue;

#[derive(Debug)]
pub enum HikeMapError {
    XmlParse(quick_xml::Error),
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
    /// A coordinate array that is neither `[lat, lon]` nor `[lat, lon, ele]`.
    InvalidPosition(usize),
    InvalidTimestamp(String),
    /// Time zone name not in the IANA database.
    InvalidZone(String),
    /// Non-success HTTP response from the hike API.
    Http {
        status: u16,
        status_text: String,
    },
    Request(reqwest::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for HikeMapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "Missing attribute '{attribute}' on <{element}>")
            }
            Self::InvalidAttribute {
                element,
                attribute,
                value,
            } => write!(
                f,
                "Invalid value '{value}' for attribute '{attribute}' on <{element}>"
            ),
            Self::InvalidPosition(len) => {
                write!(f, "Position must have 2 or 3 values, got {len}")
            }
            Self::InvalidTimestamp(value) => write!(f, "Invalid timestamp '{value}'"),
            Self::InvalidZone(name) => write!(f, "Unknown time zone '{name}'"),
            Self::Http {
                status,
                status_text,
            } => write!(f, "HttpError: ({status}) {status_text}"),
            Self::Request(e) => write!(f, "Request error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for HikeMapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::XmlParse(e) => Some(e),
            Self::Request(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for HikeMapError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<reqwest::Error> for HikeMapError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e)
    }
}

impl From<serde_json::Error> for HikeMapError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<HikeMapError> for JsValue {
    fn from(e: HikeMapError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
