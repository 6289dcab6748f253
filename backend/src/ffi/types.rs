//! Type conversion utilities for FFI boundary
//!
//! Inputs arrive as Python dicts and are routed through `serde_json::Value`
//! into the same serde types the Rust API uses, so field names match the
//! stored camelCase documents. Outputs go the other way.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{ErrorDescriptor, ErrorKind};
use crate::service::ServiceResult;

// ========================================================================
// Python <-> JSON
// ========================================================================

/// Convert an arbitrary Python value into JSON
///
/// Supports `None`, bool, int, float, str, list and dict (string keys).
pub fn py_to_json(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    // bool is a subclass of int, so it must be tested first
    if let Ok(flag) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(flag.is_true()));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(Value::from(obj.extract::<i64>()?));
    }
    if let Ok(float) = obj.downcast::<PyFloat>() {
        return Number::from_f64(float.value())
            .map(Value::Number)
            .ok_or_else(|| PyValueError::new_err("non-finite float"));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(Value::String(obj.extract()?));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list
            .iter()
            .map(|item| py_to_json(&item))
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Array);
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut map = Map::new();
        for (key, value) in dict.iter() {
            let key: String = key.extract()?;
            map.insert(key, py_to_json(&value)?);
        }
        return Ok(Value::Object(map));
    }
    Err(PyValueError::new_err(format!("unsupported value: {}", obj)))
}

/// Convert JSON into a Python value
pub fn json_to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    Ok(match value {
        Value::Null => py.None(),
        Value::Bool(flag) => flag.to_object(py),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(int), _) => int.to_object(py),
            (None, Some(float)) => float.to_object(py),
            (None, None) => py.None(),
        },
        Value::String(text) => text.to_object(py),
        Value::Array(items) => {
            let list = PyList::empty_bound(py);
            for item in items {
                list.append(json_to_py(py, item)?)?;
            }
            list.into_any().unbind()
        }
        Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            dict.into_any().unbind()
        }
    })
}

/// Parse a Python dict into a request type
///
/// Malformed input is reported as a validation error rather than raised.
pub fn parse_input<T: DeserializeOwned>(dict: &Bound<'_, PyDict>) -> ServiceResult<T> {
    let value = py_to_json(dict.as_any())
        .map_err(|e| ErrorDescriptor::new(ErrorKind::Validation, e.to_string()))?;
    serde_json::from_value(value)
        .map_err(|e| ErrorDescriptor::new(ErrorKind::Validation, format!("invalid input: {}", e)))
}

/// Parse a bare string (enum label) into a request type
pub fn parse_label<T: DeserializeOwned>(label: &str) -> ServiceResult<T> {
    serde_json::from_value(Value::String(label.to_string()))
        .map_err(|e| ErrorDescriptor::new(ErrorKind::Validation, format!("invalid value: {}", e)))
}

/// Wrap a service result as `{"ok": true, "value": ...}` or
/// `{"ok": false, "error": {"kind", "message", "fields"}}`
pub fn response_to_py<T: Serialize>(py: Python<'_>, result: ServiceResult<T>) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    match result {
        Ok(value) => {
            let value = serde_json::to_value(&value)
                .map_err(|e| PyValueError::new_err(format!("Failed to encode result: {}", e)))?;
            dict.set_item("ok", true)?;
            dict.set_item("value", json_to_py(py, &value)?)?;
        }
        Err(error) => {
            let error = serde_json::to_value(&error)
                .map_err(|e| PyValueError::new_err(format!("Failed to encode error: {}", e)))?;
            dict.set_item("ok", false)?;
            dict.set_item("error", json_to_py(py, &error)?)?;
        }
    }
    Ok(dict.unbind())
}
