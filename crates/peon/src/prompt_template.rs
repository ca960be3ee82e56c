use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

use crate::models::tool::Tool;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

#[derive(Serialize)]
struct SystemContext<'a> {
    tools: Vec<&'a str>,
    done_phrase: &'a str,
}

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    tera.render("inline_template", &context)
}

/// Render the default system prompt for the given tools and completion marker
pub fn system_prompt(tools: &[Tool], done_phrase: &str) -> Result<String, TeraError> {
    let context = SystemContext {
        tools: tools.iter().map(|tool| tool.name.as_str()).collect(),
        done_phrase,
    };
    load_prompt(SYSTEM_TEMPLATE, &context)
}
