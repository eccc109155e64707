use std::fs;
use std::io::{self, Read};

use telcobot_agent::parse_markup;
use telcobot_agent::ui::strip_code_fences;

use crate::commands::CommandResult;

/// Parses a markup file (`-` for stdin) into the component tree JSON.
pub fn run(path: &str) -> CommandResult {
    let source = if path == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).map(|_| buffer)
    } else {
        fs::read_to_string(path)
    };

    match source {
        Ok(source) => render_source(&source),
        Err(error) => {
            CommandResult::failure("render", "io", format!("could not read `{path}`: {error}"), 1)
        }
    }
}

pub fn render_source(source: &str) -> CommandResult {
    match parse_markup(strip_code_fences(source)) {
        Ok(tree) => CommandResult::document("render", 0, &tree),
        Err(error) => CommandResult::failure("render", "markup_parse", error.to_string(), 4),
    }
}
