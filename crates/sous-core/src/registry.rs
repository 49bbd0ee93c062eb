//! Translate tool host descriptors into model-side function declarations.

use serde_json::{Value, json};
use sous_protocol::{FunctionDeclaration, FunctionTool, ToolDescriptor};

/// One declaration per descriptor, in order. Names are not deduplicated.
pub fn to_function_tools(descriptors: &[ToolDescriptor]) -> Vec<FunctionTool> {
    descriptors.iter().map(to_function_tool).collect()
}

fn to_function_tool(descriptor: &ToolDescriptor) -> FunctionTool {
    // Only an absent schema is replaced; a declared `{}` is forwarded untouched.
    let parameters = match &descriptor.input_schema {
        Some(schema) if !schema.is_null() => schema.clone(),
        _ => empty_object_schema(),
    };
    FunctionTool::function(FunctionDeclaration {
        name: descriptor.name.clone(),
        description: descriptor.description.clone().unwrap_or_default(),
        parameters,
    })
}

fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}
