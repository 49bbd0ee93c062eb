use serde_json::json;
use sous_protocol::ToolDescriptor;

/// Descriptors for the pantry tools, one with and one without a schema.
pub fn pantry_tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("pantry_list_items").with_description("List pantry items"),
        ToolDescriptor::new("pantry_upsert_item")
            .with_description("Add or update a pantry item")
            .with_input_schema(json!({
                "type": "object",
                "properties": { "item": { "type": "object" } },
                "required": ["item"]
            })),
    ]
}
