//! Introspection query, its typed result, and an SDL printer.
//!
//! The printer follows the layout of graphql-js `printSchema`: directives
//! first, then types in introspection order, blocks separated by a blank
//! line. Built-in scalars, built-in directives and `__` types are omitted.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
      isRepeatable
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}
"#;

pub(crate) const BUILT_IN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];
const BUILT_IN_DIRECTIVES: &[&str] = &["skip", "include", "deprecated", "specifiedBy", "oneOf"];
pub(crate) const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct IntrospectionData {
    #[serde(rename = "__schema")]
    pub schema: IntrospectionSchema,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    pub query_type: Option<NamedRef>,
    pub mutation_type: Option<NamedRef>,
    pub subscription_type: Option<NamedRef>,
    pub types: Vec<FullType>,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullType {
    pub kind: TypeKind,
    pub name: String,
    pub description: Option<String>,
    pub fields: Option<Vec<Field>>,
    pub input_fields: Option<Vec<InputValue>>,
    pub interfaces: Option<Vec<TypeRef>>,
    pub enum_values: Option<Vec<EnumValue>>,
    pub possible_types: Option<Vec<TypeRef>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub default_value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    pub name: Option<String>,
    pub of_type: Option<Box<TypeRef>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directive {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
    #[serde(default)]
    pub is_repeatable: bool,
}

impl TypeRef {
    /// `[Name!]!` notation.
    pub fn render(&self) -> String {
        match self.kind {
            TypeKind::NonNull => format!("{}!", self.inner()),
            TypeKind::List => format!("[{}]", self.inner()),
            _ => self.name.clone().unwrap_or_default(),
        }
    }

    fn inner(&self) -> String {
        self.of_type
            .as_deref()
            .map(TypeRef::render)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// SDL printer
// ---------------------------------------------------------------------------

impl IntrospectionSchema {
    /// Render as GraphQL SDL, newline-terminated.
    pub fn to_sdl(&self) -> String {
        let mut blocks = Vec::new();

        if let Some(schema) = self.schema_block() {
            blocks.push(schema);
        }
        for directive in &self.directives {
            if !BUILT_IN_DIRECTIVES.contains(&directive.name.as_str()) {
                blocks.push(print_directive(directive));
            }
        }
        for ty in &self.types {
            if ty.name.starts_with("__")
                || (ty.kind == TypeKind::Scalar && BUILT_IN_SCALARS.contains(&ty.name.as_str()))
            {
                continue;
            }
            blocks.push(print_type(ty));
        }

        let mut sdl = blocks.join("\n\n");
        sdl.push('\n');
        sdl
    }

    /// `schema { … }`, only when a root type has a non-conventional name.
    fn schema_block(&self) -> Option<String> {
        let roots = [
            ("query", &self.query_type, "Query"),
            ("mutation", &self.mutation_type, "Mutation"),
            ("subscription", &self.subscription_type, "Subscription"),
        ];
        let conventional = roots
            .iter()
            .all(|(_, root, name)| root.as_ref().map_or(true, |r| r.name == *name));
        if conventional {
            return None;
        }

        let mut out = String::from("schema {\n");
        for (op, root, _) in roots {
            if let Some(root) = root {
                let _ = writeln!(out, "  {op}: {}", root.name);
            }
        }
        out.push('}');
        Some(out)
    }
}

fn print_type(ty: &FullType) -> String {
    let mut out = print_description(ty.description.as_deref(), "");
    match ty.kind {
        TypeKind::Scalar => {
            let _ = write!(out, "scalar {}", ty.name);
        }
        TypeKind::Object | TypeKind::Interface => {
            let keyword = if ty.kind == TypeKind::Object { "type" } else { "interface" };
            let _ = write!(out, "{keyword} {}", ty.name);
            let interfaces: Vec<String> = ty
                .interfaces
                .iter()
                .flatten()
                .map(TypeRef::render)
                .collect();
            if !interfaces.is_empty() {
                let _ = write!(out, " implements {}", interfaces.join(" & "));
            }
            let lines: Vec<String> = ty.fields.iter().flatten().map(print_field).collect();
            out.push_str(&print_block(&lines));
        }
        TypeKind::Union => {
            let members: Vec<String> = ty
                .possible_types
                .iter()
                .flatten()
                .map(TypeRef::render)
                .collect();
            let _ = write!(out, "union {}", ty.name);
            if !members.is_empty() {
                let _ = write!(out, " = {}", members.join(" | "));
            }
        }
        TypeKind::Enum => {
            let _ = write!(out, "enum {}", ty.name);
            let lines: Vec<String> = ty
                .enum_values
                .iter()
                .flatten()
                .map(|value| {
                    format!(
                        "{}  {}{}",
                        print_description(value.description.as_deref(), "  "),
                        value.name,
                        print_deprecated(value.is_deprecated, value.deprecation_reason.as_deref())
                    )
                })
                .collect();
            out.push_str(&print_block(&lines));
        }
        TypeKind::InputObject => {
            let _ = write!(out, "input {}", ty.name);
            let lines: Vec<String> = ty
                .input_fields
                .iter()
                .flatten()
                .map(|field| {
                    format!(
                        "{}  {}",
                        print_description(field.description.as_deref(), "  "),
                        print_input_value(field)
                    )
                })
                .collect();
            out.push_str(&print_block(&lines));
        }
        TypeKind::List | TypeKind::NonNull => {
            let _ = write!(out, "# unexpected wrapper type {}", ty.name);
        }
    }
    out
}

fn print_field(field: &Field) -> String {
    format!(
        "{}  {}{}: {}{}",
        print_description(field.description.as_deref(), "  "),
        field.name,
        print_args(&field.args, "  "),
        field.ty.render(),
        print_deprecated(field.is_deprecated, field.deprecation_reason.as_deref())
    )
}

fn print_directive(directive: &Directive) -> String {
    format!(
        "{}directive @{}{}{} on {}",
        print_description(directive.description.as_deref(), ""),
        directive.name,
        print_args(&directive.args, ""),
        if directive.is_repeatable { " repeatable" } else { "" },
        directive.locations.join(" | ")
    )
}

/// Inline `(a: Int, b: String)` unless an argument has a description.
fn print_args(args: &[InputValue], indent: &str) -> String {
    if args.is_empty() {
        return String::new();
    }
    if args.iter().all(|arg| arg.description.is_none()) {
        let inline: Vec<String> = args.iter().map(print_input_value).collect();
        return format!("({})", inline.join(", "));
    }

    let inner = format!("{indent}  ");
    let mut out = String::from("(\n");
    for arg in args {
        out.push_str(&print_description(arg.description.as_deref(), &inner));
        let _ = writeln!(out, "{inner}{}", print_input_value(arg));
    }
    let _ = write!(out, "{indent})");
    out
}

fn print_input_value(value: &InputValue) -> String {
    match &value.default_value {
        Some(default) => format!("{}: {} = {default}", value.name, value.ty.render()),
        None => format!("{}: {}", value.name, value.ty.render()),
    }
}

fn print_block(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = String::from(" {\n");
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
    out.push('}');
    out
}

fn print_deprecated(is_deprecated: bool, reason: Option<&str>) -> String {
    if !is_deprecated {
        return String::new();
    }
    match reason {
        Some(reason) if reason != DEFAULT_DEPRECATION_REASON => {
            // A JSON string literal is a valid GraphQL string literal.
            let quoted = serde_json::to_string(reason).unwrap_or_else(|_| format!("\"{reason}\""));
            format!(" @deprecated(reason: {quoted})")
        }
        _ => " @deprecated".to_owned(),
    }
}

/// Block-string description followed by a newline, each line indented.
fn print_description(description: Option<&str>, indent: &str) -> String {
    let Some(description) = description.filter(|d| !d.is_empty()) else {
        return String::new();
    };
    let escaped = description.replace("\"\"\"", "\\\"\"\"");
    if !escaped.contains('\n') && !escaped.ends_with('"') {
        return format!("{indent}\"\"\"{escaped}\"\"\"\n");
    }
    let mut out = format!("{indent}\"\"\"\n");
    for line in escaped.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{indent}{line}");
        }
    }
    let _ = writeln!(out, "{indent}\"\"\"");
    out
}
