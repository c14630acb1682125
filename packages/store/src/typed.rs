//! Typed access to store values via serde.

use serde::de::DeserializeOwned;
use serde::Serialize;
use statema_point::{Error, Value};

use crate::Store;

/// Convert a Value to a Rust type via serde.
pub fn from_value<T: DeserializeOwned>(name: &str, value: Value) -> Result<T, Error> {
    let json = serde_json::to_value(value).map_err(|e| Error::conversion(name, e.to_string()))?;
    serde_json::from_value(json).map_err(|e| Error::conversion(name, e.to_string()))
}

/// Convert a Rust type to a Value via serde.
pub fn to_value<T: Serialize + ?Sized>(name: &str, data: &T) -> Result<Value, Error> {
    let json = serde_json::to_value(data).map_err(|e| Error::conversion(name, e.to_string()))?;
    serde_json::from_value(json).map_err(|e| Error::conversion(name, e.to_string()))
}

impl Store {
    /// Locked read, deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, Error> {
        from_value(key, self.get(key)?)
    }

    /// Serialize `data` and write it through the point's validator.
    pub fn set_as<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<(), Error> {
        // Resolve the key first so an unknown field wins over a conversion error.
        let point = self.point(key)?;
        point.set(to_value(key, data)?)
    }

    /// The snapshot as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .snapshot()
            .into_iter()
            .map(|(name, value)| {
                let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                (name, json)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}
