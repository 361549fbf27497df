pub mod cli;
pub mod error;
pub mod flowspec;
pub mod routers;
pub mod terms;
pub mod value;

pub use cli::{Cli, cli_parse};
pub use error::ExtractError;
pub use flowspec::{Action, FlowSpec};
pub use routers::{Platform, parse_flow_spec};
pub use terms::{parse_prefix, parse_rate_limit};
pub use value::{
    BitmaskValue, Combinator, NumericOp, NumericTerm, NumericValue, parse_bitmask,
    parse_numeric_expression,
};

use std::io::Read;

fn read_capture(file: Option<&std::path::Path>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read capture '{}': {}", path.display(), e).into()),
        None => {
            let mut data = String::new();
            std::io::stdin()
                .read_to_string(&mut data)
                .map_err(|e| format!("Failed to read capture from stdin: {}", e))?;
            Ok(data)
        }
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli_parse();

    let data = read_capture(cli.file.as_deref())?;
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| cli.platform.default_command().to_string());

    if cli.verbose > 0 {
        eprintln!("Platform: {:?}", cli.platform);
        eprintln!("Command: {}", command);
        match &cli.file {
            Some(path) => eprintln!("Source: {}", path.display()),
            None => eprintln!("Source: stdin"),
        }
    }

    let entries = parse_flow_spec(cli.platform, &data, Some(&command))
        .map_err(|e| format!("Extraction failed: {}", e))?;

    if cli.verbose > 0 {
        eprintln!(
            "Parsed {} flow-spec entr{}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" }
        );
    }

    let json = if cli.compact {
        serde_json::to_string(&entries)?
    } else {
        serde_json::to_string_pretty(&entries)?
    };
    println!("{}", json);

    Ok(())
}
