// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Integration tests for timers, exit handlers and the main module

mod common;

use common::{config, fixture, prop, runtime, write};
use spacey_require::engine::ScriptEngine;
use spacey_require::{NodeError, Value};
use std::time::{Duration, Instant};

#[test]
fn test_cancelled_timers_never_run() {
    let (_tmp, root) = fixture();
    let (rt, engine) = runtime(config(&root));

    let set_timeout = rt.global().lookup("setTimeout").unwrap();
    let clear_timeout = rt.global().lookup("clearTimeout").unwrap();

    let id = engine
        .call_function(&set_timeout, &[engine.tracer("cancelled"), Value::Number(0.0)])
        .unwrap();
    engine
        .call_function(&set_timeout, &[engine.tracer("kept"), Value::Number(0.0)])
        .unwrap();
    engine.call_function(&clear_timeout, &[id]).unwrap();

    let ran = rt.run_due_callbacks(Instant::now() + Duration::from_secs(1)).unwrap();
    assert_eq!(ran, 1);
    assert_eq!(engine.trace(), vec!["kept"]);
}

#[test]
fn test_equal_due_times_run_in_registration_order() {
    let (_tmp, root) = fixture();
    let (rt, engine) = runtime(config(&root));
    let due = Instant::now();

    for label in ["first", "second", "third"] {
        rt.queue().schedule_at(engine.tracer(label), due, None);
    }

    rt.run_due_callbacks(due).unwrap();
    assert_eq!(engine.trace(), vec!["first", "second", "third"]);
    assert!(rt.queue().is_empty());
}

#[test]
fn test_callbacks_not_yet_due_stay_queued() {
    let (_tmp, root) = fixture();
    let (rt, engine) = runtime(config(&root));
    let now = Instant::now();

    rt.queue().schedule_at(engine.tracer("soon"), now, None);
    rt.queue()
        .schedule_at(engine.tracer("later"), now + Duration::from_secs(60), None);

    assert_eq!(rt.run_due_callbacks(now).unwrap(), 1);
    assert_eq!(rt.queue().len(), 1);
}

#[test]
fn test_exit_handlers_run_once_in_order() {
    let (_tmp, root) = fixture();
    write(&root, "main.js", "on-exit one\non-exit two\non-exit three\nexit 0");
    let (rt, engine) = runtime(config(&root));

    let code = rt.run_file(&root.join("main.js")).unwrap();
    assert_eq!(code, 0);
    assert_eq!(engine.trace(), vec!["one", "two", "three"]);

    let exit = rt
        .global()
        .lookup("process")
        .and_then(|p| p.as_object().and_then(|p| p.get("exit")))
        .unwrap();
    engine.call_function(&exit, &[Value::Number(1.0)]).unwrap();
    assert_eq!(engine.trace().len(), 3);
    assert_eq!(rt.exit_code(), Some(0));
}

#[test]
fn test_exit_handlers_run_when_main_finishes() {
    let (_tmp, root) = fixture();
    write(&root, "main.js", "on-exit bye\ntimeout 0 tick");
    let (rt, engine) = runtime(config(&root));

    assert_eq!(rt.run_file(&root.join("main.js")).unwrap(), 0);
    assert_eq!(engine.trace(), vec!["tick", "bye"]);
    assert!(rt.exit_executor().has_executed());
}

#[test]
fn test_exit_stops_pending_callbacks() {
    let (_tmp, root) = fixture();
    write(&root, "main.js", "timeout 0 never\nexit 7");
    let (rt, engine) = runtime(config(&root));

    assert_eq!(rt.run_file(&root.join("main.js")).unwrap(), 7);
    assert_eq!(rt.exit_code(), Some(7));
    assert!(engine.trace().is_empty());
}

#[test]
fn test_run_file_relative_to_working_dir() {
    let (_tmp, root) = fixture();
    write(&root, "bin/app.js", "set started yes");
    let (rt, _engine) = runtime(config(&root));

    assert_eq!(rt.run_file(std::path::Path::new("bin/app.js")).unwrap(), 0);
    assert_eq!(
        prop(&rt.require("./bin/app").unwrap(), "started"),
        Value::from("yes")
    );
    assert!(matches!(
        rt.run_file(std::path::Path::new("bin/missing.js")),
        Err(NodeError::ModuleNotFound(_))
    ));
}

#[test]
fn test_process_reflects_config() {
    let (_tmp, root) = fixture();
    let mut cfg = config(&root);
    cfg.argv = vec!["main.js".to_string(), "--flag".to_string()];
    cfg.env.insert("MODE".to_string(), "test".to_string());
    let (rt, engine) = runtime(cfg);

    let process = rt.require("process").unwrap();
    let argv = prop(&process, "argv");
    assert_eq!(
        argv.as_object().unwrap().array_items(),
        vec![Value::from("spacey"), Value::from("main.js"), Value::from("--flag")]
    );
    assert_eq!(prop(&prop(&process, "env"), "MODE"), Value::from("test"));

    let cwd = engine.call_function(&prop(&process, "cwd"), &[]).unwrap();
    assert_eq!(cwd, Value::String(root.display().to_string()));
}
