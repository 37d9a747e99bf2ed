//! CLI entry point for burrow_export.
//! Usage: cargo run -p burrow_export -- compile demos/world.toml

use std::{env, fs, process};

use burrow_data::{WorldDef, validate_world};
use burrow_export::compile_world_to_source;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    // Accept either:
    // 1) cargo run: <bin> -- <cmd> <args>
    // 2) direct:    <bin> <cmd> <args>
    // Extract subcommand and collect the rest for flags/positional
    let rest: Vec<String> = match args.as_slice() {
        [_, flag, cmd, tail @ ..] if flag == "--" && (cmd == "compile" || cmd == "lint") => {
            let mut v = vec![cmd.clone()];
            v.extend_from_slice(tail);
            v
        },
        [_, cmd, tail @ ..] if cmd == "compile" || cmd == "lint" => {
            let mut v = vec![cmd.clone()];
            v.extend_from_slice(tail);
            v
        },
        _ => {
            eprintln!(
                "Usage:\n  burrow_export compile <world.toml> [--out <file.cpp>]\n  burrow_export lint <world.toml> [--strict]"
            );
            process::exit(2);
        },
    };
    let cmd = &rest[0];
    if cmd == "compile" {
        run_compile(&rest[1..]);
    } else if cmd == "lint" {
        run_lint(&rest[1..]);
    } else {
        eprintln!("unknown command: {}", cmd);
        process::exit(2);
    }
}

fn run_compile(args: &[String]) {
    let mut path: Option<String> = None;
    let mut out_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--out" {
            if i + 1 >= args.len() {
                eprintln!("--out requires a filepath");
                process::exit(2);
            }
            out_path = Some(args[i + 1].clone());
            i += 2;
            continue;
        }
        if path.is_none() {
            path = Some(args[i].clone());
        }
        i += 1;
    }
    let Some(path) = path else {
        eprintln!("Usage: burrow_export compile <world.toml> [--out <file.cpp>]");
        process::exit(2);
    };
    let world = load_world_def(&path);

    // Pre-flight lint so a batch of problems surfaces before the first abort.
    let findings = validate_world(&world);
    for finding in &findings {
        eprintln!("lint: {}", finding);
    }
    if !findings.is_empty() {
        eprintln!("compile: aborted with {} lint finding(s)", findings.len());
        process::exit(1);
    }

    match compile_world_to_source(&world) {
        Ok(src) => {
            if let Some(out) = out_path {
                fs::write(&out, src).unwrap_or_else(|e| {
                    eprintln!("error: writing '{}': {}", &out, e);
                    process::exit(1);
                });
            } else {
                println!("{}", src);
            }
        },
        Err(e) => {
            eprintln!("compile error: {}", e);
            process::exit(1);
        },
    }
}

fn run_lint(args: &[String]) {
    let mut path: Option<String> = None;
    let mut strict = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--strict" => {
                strict = true;
                i += 1;
            },
            s => {
                if path.is_none() {
                    path = Some(s.to_string());
                }
                i += 1;
            },
        }
    }
    let Some(path) = path else {
        eprintln!("Usage: burrow_export lint <world.toml> [--strict]");
        process::exit(2);
    };
    let world = load_world_def(&path);

    let findings = validate_world(&world);
    for finding in &findings {
        eprintln!("lint: {}", finding);
    }
    if findings.is_empty() {
        eprintln!("lint: OK (no findings)");
    } else if strict {
        process::exit(1);
    }
}

fn load_world_def(path: &str) -> WorldDef {
    let src = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: unable to read '{}': {}", path, e);
        process::exit(1);
    });
    toml::from_str(&src).unwrap_or_else(|e| {
        eprintln!("error: parsing '{}': {}", path, e);
        process::exit(1);
    })
}
