use serde::{Deserialize, Serialize};

/// Declares an engine-owned payload the controller forwards without interpreting
macro_rules! opaque_payload {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub serde_json::Value);

        impl From<serde_json::Value> for $name {
            fn from(value: serde_json::Value) -> Self {
                Self(value)
            }
        }
    };
}

opaque_payload!(
    /// Server-side parameters for creating one transport (id, ICE, DTLS)
    TransportOptions
);

opaque_payload!(
    /// Codec and header-extension capabilities of a router or device
    RtpCapabilities
);

opaque_payload!(
    /// Parameters describing one RTP stream
    RtpParameters
);

opaque_payload!(
    /// Client-side DTLS fingerprint and role for a transport
    DtlsParameters
);

impl RtpCapabilities {
    /// Looks up a codec by mime type, ignoring case (`"video/VP8"` matches `"video/vp8"`)
    pub fn find_codec(&self, mime_type: &str) -> Option<serde_json::Value> {
        self.0
            .get("codecs")?
            .as_array()?
            .iter()
            .find(|codec| {
                codec
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .is_some_and(|value| value.eq_ignore_ascii_case(mime_type))
            })
            .cloned()
    }
}
