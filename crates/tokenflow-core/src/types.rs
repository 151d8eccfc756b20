use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A value held by a process variable, a process-scoped instance value or a
/// token-local value.
///
/// Thin wrapper around a JSON value so stores can persist it without knowing
/// the concrete Rust type that produced it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DataPacket {
    /// The inner JSON value
    pub value: serde_json::Value,
}

impl DataPacket {
    /// Create a new data packet from a JSON value
    #[inline]
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Create a null data packet
    #[inline]
    pub fn null() -> Self {
        Self {
            value: serde_json::Value::Null,
        }
    }

    /// Get the inner JSON value
    #[inline]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.value
    }

    /// Take ownership of the inner JSON value
    #[inline]
    pub fn into_value(self) -> serde_json::Value {
        self.value
    }

    /// Check if the data packet is null
    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Try to convert the data packet to a string
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Try to convert the data packet to a number
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    /// Try to convert the data packet to a boolean
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    /// Try to convert the data packet to a specific type
    pub fn to<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.value.clone())
    }

    /// Create a data packet from a serializable value
    pub fn from<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize,
    {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Create a data packet from a string
    #[inline]
    pub fn from_string(s: &str) -> Self {
        Self::new(serde_json::Value::String(s.to_string()))
    }

    /// Create a data packet from a number. NaN and infinities become null.
    #[inline]
    pub fn from_f64(n: f64) -> Self {
        match serde_json::Number::from_f64(n) {
            Some(num) => Self::new(serde_json::Value::Number(num)),
            None => Self::null(),
        }
    }

    /// Create a data packet from a boolean
    #[inline]
    pub fn from_bool(b: bool) -> Self {
        Self::new(serde_json::Value::Bool(b))
    }
}

impl From<serde_json::Value> for DataPacket {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

impl From<bool> for DataPacket {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<&str> for DataPacket {
    fn from(value: &str) -> Self {
        Self::from_string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_packet_accessors() {
        let packet = DataPacket::new(json!({"name": "test"}));
        assert_eq!(packet.as_value()["name"], "test");
        assert!(!packet.is_null());
        assert!(DataPacket::null().is_null());
        assert_eq!(DataPacket::from_string("abc").as_str(), Some("abc"));
        assert_eq!(DataPacket::from_f64(4.5).as_f64(), Some(4.5));
        assert_eq!(DataPacket::from_bool(true).as_bool(), Some(true));
    }

    #[test]
    fn test_data_packet_nan_is_null() {
        assert!(DataPacket::from_f64(f64::NAN).is_null());
    }

    #[test]
    fn test_data_packet_serializes_transparently() {
        let packet = DataPacket::new(json!({"nested": [1, 2]}));
        let serialized = serde_json::to_string(&packet).unwrap();
        assert_eq!(serialized, r#"{"nested":[1,2]}"#);

        let back: DataPacket = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back, packet);
    }

    #[test]
    fn test_data_packet_typed_conversion() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Approval {
            approved: bool,
            by: String,
        }

        let approval = Approval {
            approved: true,
            by: "ops".to_string(),
        };
        let packet = DataPacket::from(&approval).unwrap();
        let decoded: Approval = packet.to().unwrap();
        assert_eq!(decoded, approval);
    }
}
