use std::fmt;

use http::StatusCode;

use super::MessageError;

macro_rules! response_statuses {
    ($(($variant:ident, $code:literal, $phrase:literal),)+) => {
        /// The closed set of status codes a response may carry.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum ResponseStatus {
            $(
                #[doc = concat!(stringify!($code), " ", $phrase)]
                $variant = $code,
            )+
        }

        impl ResponseStatus {
            /// The reason phrase used when a response does not set one.
            pub fn phrase(&self) -> &'static str {
                match self {
                    $(ResponseStatus::$variant => $phrase,)+
                }
            }
        }

        impl TryFrom<u16> for ResponseStatus {
            type Error = MessageError;

            fn try_from(code: u16) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(ResponseStatus::$variant),)+
                    _ => Err(MessageError::UnknownStatusCode(code)),
                }
            }
        }
    };
}

response_statuses! {
    (Continue, 100, "Continue"),
    (SwitchingProtocols, 101, "Switching Protocols"),
    (Processing, 102, "Processing"),
    (EarlyHints, 103, "Early Hints"),

    (Ok, 200, "Ok"),
    (Created, 201, "Created"),
    (Accepted, 202, "Accepted"),
    (NonAuthoritativeInformation, 203, "Non-Authoritative Information"),
    (NoContent, 204, "No Content"),
    (ResetContent, 205, "Reset Content"),
    (PartialContent, 206, "Partial Content"),
    (MultiStatus, 207, "Multi-Status"),
    (AlreadyReported, 208, "Already Reported"),
    (ImUsed, 226, "IM Used"),

    (MultipleChoices, 300, "Multiple Choices"),
    (MovedPermanently, 301, "Moved Permanently"),
    (Found, 302, "Found"),
    (SeeOther, 303, "See Other"),
    (NotModified, 304, "Not Modified"),
    (UseProxy, 305, "Use Proxy"),
    (SwitchProxy, 306, "Switch Proxy"),
    (TemporaryRedirect, 307, "Temporary Redirect"),
    (PermanentRedirect, 308, "Permanent Redirect"),

    (BadRequest, 400, "Bad Request"),
    (Unauthorized, 401, "Unauthorized"),
    (PaymentRequired, 402, "Payment Required"),
    (Forbidden, 403, "Forbidden"),
    (NotFound, 404, "Not Found"),
    (MethodNotAllowed, 405, "Method Not Allowed"),
    (NotAcceptable, 406, "Not Acceptable"),
    (ProxyAuthenticationRequired, 407, "Proxy Authentication Required"),
    (RequestTimeout, 408, "Request Timeout"),
    (Conflict, 409, "Conflict"),
    (Gone, 410, "Gone"),
    (LengthRequired, 411, "Length Required"),
    (PreconditionFailed, 412, "Precondition Failed"),
    (PayloadTooLarge, 413, "Payload Too Large"),
    (UriTooLong, 414, "URI Too Long"),
    (UnsupportedMediaType, 415, "Unsupported Media Type"),
    (RangeNotSatisfiable, 416, "Range Not Satisfiable"),
    (ExpectationFailed, 417, "Expection Failed"),
    (ImATeapot, 418, "I'm A Teapot"),
    (MisdirectedRequest, 421, "Misdirected Request"),
    (UnprocessableEntity, 422, "Unprocessable Entity"),
    (Locked, 423, "Locked"),
    (FailedDependency, 424, "Failed Dependency"),
    (TooEarly, 425, "Too Early"),
    (UpgradeRequired, 426, "Upgrade Required"),
    (PreconditionRequired, 428, "Precondition Required"),
    (TooManyRequests, 429, "Too Many Requests"),
    (RequestHeaderFieldsTooLarge, 431, "Request Header Fields Too Large"),
    (UnavailableForLegalReasons, 451, "Unavailable For Legal Reasons"),

    (InternalServerError, 500, "Internal Server Error"),
    (NotImplemented, 501, "Not Implemented"),
    (BadGateway, 502, "Bad Gateway"),
    (ServiceUnavailable, 503, "Service Unavailable"),
    (GatewayTimeout, 504, "Gateway Timeout"),
    (HttpVersionNotSupported, 505, "HTTP Version Not Supported"),
    (VariantAlsoNegotiates, 506, "Variant Also Negotiates"),
    (InsufficientStorage, 507, "Insufficient Storage"),
    (LoopDetected, 508, "Loop Detected"),
    (NotExtended, 510, "Not Extended"),
    (NetworkAuthenticationRequired, 511, "Network Authentication Required"),
}

impl ResponseStatus {
    pub fn code(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.phrase())
    }
}

impl From<ResponseStatus> for u16 {
    fn from(status: ResponseStatus) -> Self {
        status.code()
    }
}

impl From<ResponseStatus> for StatusCode {
    fn from(status: ResponseStatus) -> Self {
        // every code in the table is within 100..=999
        StatusCode::from_u16(status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl TryFrom<StatusCode> for ResponseStatus {
    type Error = MessageError;

    fn try_from(code: StatusCode) -> Result<Self, Self::Error> {
        Self::try_from(code.as_u16())
    }
}
