// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Node.js `fs` module (synchronous subset)

use crate::engine::{JsObject, Value};
use crate::error::{NodeError, Result};
use crate::modules::{NativeContext, NativeModule, option_arg, string_arg};
use std::fs;
use std::path::Path;

/// The `fs` native module
pub struct FsModule;

impl NativeModule for FsModule {
    fn id(&self) -> &'static str {
        "fs"
    }

    fn build(&self, _ctx: &NativeContext) -> Result<Value> {
        Ok(Value::Object(create_module()))
    }
}

/// Create the fs module exports
pub fn create_module() -> JsObject {
    let exports = JsObject::new();

    exports.set(
        "existsSync",
        Value::function("existsSync", |args| {
            let exists = args
                .first()
                .and_then(Value::as_str)
                .is_some_and(exists_sync);
            Ok(Value::Boolean(exists))
        }),
    );
    exports.set(
        "readFileSync",
        Value::function("readFileSync", |args| {
            let path = string_arg(args, 0, "path")?;
            read_file_sync(path, option_arg(args, 1, "encoding").as_deref())
        }),
    );
    exports.set(
        "writeFileSync",
        Value::function("writeFileSync", |args| {
            let path = string_arg(args, 0, "path")?;
            let data = string_arg(args, 1, "data")?;
            fs::write(path, data)?;
            Ok(Value::Undefined)
        }),
    );
    exports.set(
        "readdirSync",
        Value::function("readdirSync", |args| {
            let path = string_arg(args, 0, "path")?;
            let names = readdir_sync(path)?;
            Ok(Value::Object(JsObject::from_array(
                names.into_iter().map(Value::String),
            )))
        }),
    );
    exports.set(
        "mkdirSync",
        Value::function("mkdirSync", |args| {
            let path = string_arg(args, 0, "path")?;
            let recursive = args
                .get(1)
                .and_then(Value::as_object)
                .and_then(|options| options.get("recursive"))
                .is_some_and(|v| v.to_boolean());
            if recursive {
                fs::create_dir_all(path)?;
            } else {
                fs::create_dir(path)?;
            }
            Ok(Value::Undefined)
        }),
    );

    let constants = JsObject::new();
    constants.set("F_OK", Value::Number(0.0));
    constants.set("R_OK", Value::Number(4.0));
    constants.set("W_OK", Value::Number(2.0));
    constants.set("X_OK", Value::Number(1.0));
    exports.set("constants", Value::Object(constants));

    exports
}

/// fs.existsSync(path)
pub fn exists_sync(path: &str) -> bool {
    Path::new(path).exists()
}

/// fs.readFileSync(path, encoding?)
pub fn read_file_sync(path: &str, encoding: Option<&str>) -> Result<Value> {
    let content = fs::read(path)?;

    match encoding {
        Some("utf8") | Some("utf-8") => {
            Ok(Value::String(String::from_utf8_lossy(&content).to_string()))
        }
        Some("base64") => Ok(Value::String(base64::Engine::encode(
            &base64::prelude::BASE64_STANDARD,
            &content,
        ))),
        Some("hex") => Ok(Value::String(hex::encode(&content))),
        Some(enc) => Err(NodeError::type_error(format!("Unknown encoding: {}", enc))),
        // Raw bytes as an array-like object
        None => Ok(Value::Object(JsObject::from_array(
            content.iter().map(|&b| Value::Number(b as f64)),
        ))),
    }
}

/// fs.readdirSync(path), sorted by name
pub fn readdir_sync(path: &str) -> Result<Vec<String>> {
    let mut names = fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().to_string()))
        .collect::<std::io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::test_support::call;

    #[test]
    fn test_read_file_encodings() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("hello.txt");
        fs::write(&file, "hi").unwrap();
        let path = file.to_str().unwrap();

        assert_eq!(read_file_sync(path, Some("utf8")).unwrap(), Value::from("hi"));
        assert_eq!(read_file_sync(path, Some("hex")).unwrap(), Value::from("6869"));
        assert_eq!(read_file_sync(path, Some("base64")).unwrap(), Value::from("aGk="));
        assert!(read_file_sync(path, Some("latin2")).is_err());

        let bytes = read_file_sync(path, None).unwrap();
        assert_eq!(
            bytes.as_object().unwrap().array_items(),
            vec![Value::Number(104.0), Value::Number(105.0)]
        );
    }

    #[test]
    fn test_module_functions() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        let module = Value::Object(create_module());
        let dir_str = Value::from(dir.to_str().unwrap());
        let file = Value::from(dir.join("a.txt").to_str().unwrap());

        assert_eq!(call(&module, "existsSync", &[dir_str.clone()]).unwrap(), Value::Boolean(false));
        call(&module, "mkdirSync", &[dir_str.clone()]).unwrap();
        call(&module, "writeFileSync", &[file.clone(), Value::from("data")]).unwrap();

        let options = JsObject::new();
        options.set("encoding", Value::from("utf8"));
        assert_eq!(
            call(&module, "readFileSync", &[file, Value::Object(options)]).unwrap(),
            Value::from("data")
        );

        let listing = call(&module, "readdirSync", &[dir_str]).unwrap();
        assert_eq!(listing.as_object().unwrap().array_items(), vec![Value::from("a.txt")]);
    }

    #[test]
    fn test_missing_file_is_fs_error() {
        assert!(matches!(
            read_file_sync("/definitely/not/here", None),
            Err(NodeError::Fs(_))
        ));
    }
}
