use colored::Colorize;
use error_model::business::{
    call_external_api, divide, parse_age, SimulatedResponse, UserDirectory, UserValidator,
};
use error_model::{
    sentinel, ApiError, DatabaseError, Error, ErrorAccumulator, ResultExt, Settings,
    ValidationError,
};
use std::path::Path;
use std::process::ExitCode;

fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn heading(title: &str) {
    let line = format!("=== {title} ===");
    if use_colors() {
        println!("\n{}", line.bold().cyan());
    } else {
        println!("\n{line}");
    }
}

fn print_chain(err: &Error, settings: &Settings) {
    for (depth, node) in err.chain_with(settings.walk).enumerate() {
        let label = format!("[{}]", node.kind().name());
        let label = if use_colors() {
            label.yellow().to_string()
        } else {
            label
        };
        if depth == 0 {
            println!("  {label} {node}");
        } else {
            println!("  {}Caused by: {label} {node}", "  ".repeat(depth));
        }
    }
    if let Some(name) = sentinel::matching_within(err, settings.walk) {
        println!("  sentinel: {name}");
    }
}

fn print_accumulated(errors: &ErrorAccumulator) {
    let summary = format!("{} error(s) occurred:", errors.len());
    if use_colors() {
        println!("  {}", summary.red());
    } else {
        println!("  {summary}");
    }
    for (i, err) in errors.iter().enumerate() {
        println!("    {}. {}", i + 1, err);
    }
}

fn load_settings() -> Result<Settings, error_model::ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => Settings::load(Path::new(&path)),
        None => Ok(Settings::default()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .format_timestamp_micros()
        .init();

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let validator = match UserValidator::new(settings.validation.clone()) {
        Ok(validator) => validator,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    heading("Plain failure");
    match divide(10.0, 0.0) {
        Ok(value) => println!("  result: {value}"),
        Err(err) => print_chain(&err, &settings),
    }

    heading("Wrapped parse failure");
    match parse_age("abc") {
        Ok(age) => println!("  age: {age}"),
        Err(err) => print_chain(&err, &settings),
    }

    heading("Dependency failure over a sentinel");
    let directory = UserDirectory::sample();
    for id in [1, 42, 0] {
        match directory.find(id) {
            Ok(user) => println!("  user {id}: {} <{}>", user.name, user.email),
            Err(err) => {
                if let Some(db) = err.find::<DatabaseError>() {
                    println!("  {} on {} failed", db.operation(), db.table());
                }
                print_chain(&err, &settings);
            }
        }
    }

    heading("Remote-service failures");
    for response in [
        SimulatedResponse::Ok,
        SimulatedResponse::Unavailable,
        SimulatedResponse::RateLimited,
        SimulatedResponse::Unauthorized,
        SimulatedResponse::Timeout,
    ] {
        match call_external_api("/v1/profile", response) {
            Ok(body) => println!("  {response:?}: {body}"),
            Err(err) => {
                println!("  {response:?}:");
                if let Some(api) = err.find::<ApiError>() {
                    let details = api
                        .details()
                        .iter()
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    println!(
                        "  code {} (retryable: {}) [{details}]",
                        api.code(),
                        api.is_retryable()
                    );
                }
                print_chain(&err, &settings);
            }
        }
    }

    heading("Accumulated validation");
    for (name, email, age) in [
        ("Alice", "alice@example.com", "30"),
        ("", "invalid-email", "abc"),
        ("Carol", "carol@example.com", "200"),
    ] {
        println!("  input: name={name:?} email={email:?} age={age:?}");
        match validator.validate(name, email, age) {
            Ok(user) => println!("  valid: {} ({})", user.name, user.age),
            Err(errors) => {
                print_accumulated(&errors);
                let fields: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.find::<ValidationError>())
                    .map(ValidationError::field)
                    .collect();
                println!("  fields with validation errors: {fields:?}");
            }
        }
    }

    heading("Identity vs text");
    let lookalike = Error::plain("not found");
    println!(
        "  same text: {}, same instance: {}",
        lookalike.message() == sentinel::NOT_FOUND.message(),
        lookalike.is(&sentinel::NOT_FOUND)
    );

    heading("JSON form");
    if let Err(err) = directory.find(42).context("loading profile 42") {
        match err.to_json() {
            Ok(json) => println!("  {json}"),
            Err(json_err) => eprintln!("  could not serialize: {json_err}"),
        }
    }

    ExitCode::SUCCESS
}
