//! Build an introspection result from SDL.
//!
//! The registry serves the schema as SDL. When the artifact is a `.json`
//! path the document is parsed and converted into the same shape an
//! endpoint introspection returns, so both sources produce interchangeable
//! files.

use std::collections::HashMap;

use graphql_parser::schema::{
    self as ast, Definition, DirectiveDefinition, TypeDefinition, TypeExtension, Value,
};

use crate::error::FetchError;
use crate::introspection::{
    Directive, EnumValue, Field, FullType, InputValue, IntrospectionData, IntrospectionSchema,
    NamedRef, TypeKind, TypeRef, BUILT_IN_SCALARS, DEFAULT_DEPRECATION_REASON,
};

type Document<'a> = ast::Document<'a, String>;

/// Parse `sdl` (downloaded from `url`) into an introspection result.
pub fn introspect_sdl(url: &str, sdl: &str) -> Result<IntrospectionData, FetchError> {
    let invalid = |message: String| FetchError::InvalidSdl {
        url: url.to_owned(),
        message,
    };
    let document = ast::parse_schema::<String>(sdl).map_err(|e| invalid(e.to_string()))?;
    let schema = build(&document).map_err(invalid)?;
    Ok(IntrospectionData { schema })
}

fn build(document: &Document<'_>) -> Result<IntrospectionSchema, String> {
    let mut kinds: HashMap<&str, TypeKind> = HashMap::new();
    for definition in &document.definitions {
        if let Definition::TypeDefinition(def) = definition {
            let (name, kind) = kind_of(def);
            if kinds.insert(name, kind).is_some() {
                return Err(format!("type {name} is defined more than once"));
            }
        }
    }
    for scalar in BUILT_IN_SCALARS {
        kinds.entry(*scalar).or_insert(TypeKind::Scalar);
    }
    let resolver = Resolver { kinds };

    let mut types = Vec::new();
    for definition in &document.definitions {
        if let Definition::TypeDefinition(def) = definition {
            types.push(resolver.full_type(def)?);
        }
    }
    for definition in &document.definitions {
        if let Definition::TypeExtension(extension) = definition {
            let name = extension_name(extension);
            let target = types
                .iter_mut()
                .find(|ty| ty.name == name)
                .ok_or_else(|| format!("cannot extend undefined type {name}"))?;
            resolver.extend(target, extension)?;
        }
    }
    link_implementations(&mut types);
    for scalar in BUILT_IN_SCALARS {
        if !types.iter().any(|ty| ty.name == *scalar) {
            types.push(empty_type(TypeKind::Scalar, scalar, None));
        }
    }

    let mut directives = Vec::new();
    for definition in &document.definitions {
        if let Definition::DirectiveDefinition(def) = definition {
            directives.push(resolver.directive(def)?);
        }
    }
    for built_in in built_in_directives() {
        if !directives.iter().any(|d| d.name == built_in.name) {
            directives.push(built_in);
        }
    }

    let (query_type, mutation_type, subscription_type) = roots(document, &types);
    Ok(IntrospectionSchema {
        query_type,
        mutation_type,
        subscription_type,
        types,
        directives,
    })
}

/// Explicit `schema { … }` roots, otherwise the conventionally named types.
fn roots(
    document: &Document<'_>,
    types: &[FullType],
) -> (Option<NamedRef>, Option<NamedRef>, Option<NamedRef>) {
    let named = |name: &Option<String>| name.clone().map(|name| NamedRef { name });
    let explicit = document.definitions.iter().find_map(|definition| match definition {
        Definition::SchemaDefinition(schema) => Some(schema),
        _ => None,
    });
    if let Some(schema) = explicit {
        return (
            named(&schema.query),
            named(&schema.mutation),
            named(&schema.subscription),
        );
    }

    let conventional = |name: &str| {
        types
            .iter()
            .any(|ty| ty.kind == TypeKind::Object && ty.name == name)
            .then(|| NamedRef {
                name: name.to_owned(),
            })
    };
    (
        conventional("Query"),
        conventional("Mutation"),
        conventional("Subscription"),
    )
}

/// Fill each interface's `possibleTypes` from the objects implementing it.
fn link_implementations(types: &mut [FullType]) {
    let implementations: Vec<(String, String)> = types
        .iter()
        .filter(|ty| ty.kind == TypeKind::Object)
        .flat_map(|ty| {
            ty.interfaces
                .iter()
                .flatten()
                .filter_map(|interface| interface.name.clone())
                .map(|interface| (interface, ty.name.clone()))
                .collect::<Vec<_>>()
        })
        .collect();

    for (interface, object) in implementations {
        if let Some(target) = types
            .iter_mut()
            .find(|ty| ty.kind == TypeKind::Interface && ty.name == interface)
        {
            target
                .possible_types
                .get_or_insert_with(Vec::new)
                .push(named_ref(TypeKind::Object, &object));
        }
    }
}

struct Resolver<'d> {
    kinds: HashMap<&'d str, TypeKind>,
}

impl Resolver<'_> {
    fn named(&self, name: &str) -> Result<TypeRef, String> {
        let kind = self
            .kinds
            .get(name)
            .copied()
            .ok_or_else(|| format!("unknown type {name}"))?;
        Ok(named_ref(kind, name))
    }

    fn type_ref(&self, ty: &ast::Type<'_, String>) -> Result<TypeRef, String> {
        let (kind, inner) = match ty {
            ast::Type::NamedType(name) => return self.named(name),
            ast::Type::ListType(inner) => (TypeKind::List, inner),
            ast::Type::NonNullType(inner) => (TypeKind::NonNull, inner),
        };
        Ok(TypeRef {
            kind,
            name: None,
            of_type: Some(Box::new(self.type_ref(inner)?)),
        })
    }

    fn field(&self, field: &ast::Field<'_, String>) -> Result<Field, String> {
        let (is_deprecated, deprecation_reason) = deprecation(&field.directives);
        Ok(Field {
            name: field.name.clone(),
            description: field.description.clone(),
            args: self.input_values(&field.arguments)?,
            ty: self.type_ref(&field.field_type)?,
            is_deprecated,
            deprecation_reason,
        })
    }

    fn fields(&self, fields: &[ast::Field<'_, String>]) -> Result<Vec<Field>, String> {
        fields.iter().map(|field| self.field(field)).collect()
    }

    fn input_values(
        &self,
        values: &[ast::InputValue<'_, String>],
    ) -> Result<Vec<InputValue>, String> {
        values
            .iter()
            .map(|value| {
                Ok(InputValue {
                    name: value.name.clone(),
                    description: value.description.clone(),
                    ty: self.type_ref(&value.value_type)?,
                    default_value: value.default_value.as_ref().map(print_value),
                })
            })
            .collect()
    }

    fn named_all(&self, names: &[String]) -> Result<Vec<TypeRef>, String> {
        names.iter().map(|name| self.named(name)).collect()
    }

    fn full_type(&self, def: &TypeDefinition<'_, String>) -> Result<FullType, String> {
        let ty = match def {
            TypeDefinition::Scalar(scalar) => {
                empty_type(TypeKind::Scalar, &scalar.name, scalar.description.clone())
            }
            TypeDefinition::Object(object) => FullType {
                fields: Some(self.fields(&object.fields)?),
                interfaces: Some(self.named_all(&object.implements_interfaces)?),
                ..empty_type(TypeKind::Object, &object.name, object.description.clone())
            },
            TypeDefinition::Interface(interface) => FullType {
                fields: Some(self.fields(&interface.fields)?),
                interfaces: Some(Vec::new()),
                possible_types: Some(Vec::new()),
                ..empty_type(
                    TypeKind::Interface,
                    &interface.name,
                    interface.description.clone(),
                )
            },
            TypeDefinition::Union(members) => FullType {
                possible_types: Some(self.named_all(&members.types)?),
                ..empty_type(TypeKind::Union, &members.name, members.description.clone())
            },
            TypeDefinition::Enum(enumeration) => FullType {
                enum_values: Some(enum_values(&enumeration.values)),
                ..empty_type(
                    TypeKind::Enum,
                    &enumeration.name,
                    enumeration.description.clone(),
                )
            },
            TypeDefinition::InputObject(input) => FullType {
                input_fields: Some(self.input_values(&input.fields)?),
                ..empty_type(TypeKind::InputObject, &input.name, input.description.clone())
            },
        };
        Ok(ty)
    }

    fn extend(
        &self,
        target: &mut FullType,
        extension: &TypeExtension<'_, String>,
    ) -> Result<(), String> {
        let expected = match extension {
            TypeExtension::Scalar(_) => TypeKind::Scalar,
            TypeExtension::Object(_) => TypeKind::Object,
            TypeExtension::Interface(_) => TypeKind::Interface,
            TypeExtension::Union(_) => TypeKind::Union,
            TypeExtension::Enum(_) => TypeKind::Enum,
            TypeExtension::InputObject(_) => TypeKind::InputObject,
        };
        if target.kind != expected {
            return Err(format!(
                "extension of {} does not match its {:?} definition",
                target.name, target.kind
            ));
        }

        match extension {
            TypeExtension::Scalar(_) => {}
            TypeExtension::Object(object) => {
                let fields = self.fields(&object.fields)?;
                let interfaces = self.named_all(&object.implements_interfaces)?;
                target.fields.get_or_insert_with(Vec::new).extend(fields);
                target.interfaces.get_or_insert_with(Vec::new).extend(interfaces);
            }
            TypeExtension::Interface(interface) => {
                let fields = self.fields(&interface.fields)?;
                target.fields.get_or_insert_with(Vec::new).extend(fields);
            }
            TypeExtension::Union(extension) => {
                let members = self.named_all(&extension.types)?;
                target.possible_types.get_or_insert_with(Vec::new).extend(members);
            }
            TypeExtension::Enum(enumeration) => {
                target
                    .enum_values
                    .get_or_insert_with(Vec::new)
                    .extend(enum_values(&enumeration.values));
            }
            TypeExtension::InputObject(input) => {
                let fields = self.input_values(&input.fields)?;
                target.input_fields.get_or_insert_with(Vec::new).extend(fields);
            }
        }
        Ok(())
    }

    fn directive(&self, def: &DirectiveDefinition<'_, String>) -> Result<Directive, String> {
        Ok(Directive {
            name: def.name.clone(),
            description: def.description.clone(),
            locations: def
                .locations
                .iter()
                .map(|location| location.as_str().to_owned())
                .collect(),
            args: self.input_values(&def.arguments)?,
            is_repeatable: def.repeatable,
        })
    }
}

fn kind_of<'d>(def: &'d TypeDefinition<'_, String>) -> (&'d str, TypeKind) {
    match def {
        TypeDefinition::Scalar(ty) => (ty.name.as_str(), TypeKind::Scalar),
        TypeDefinition::Object(ty) => (ty.name.as_str(), TypeKind::Object),
        TypeDefinition::Interface(ty) => (ty.name.as_str(), TypeKind::Interface),
        TypeDefinition::Union(ty) => (ty.name.as_str(), TypeKind::Union),
        TypeDefinition::Enum(ty) => (ty.name.as_str(), TypeKind::Enum),
        TypeDefinition::InputObject(ty) => (ty.name.as_str(), TypeKind::InputObject),
    }
}

fn extension_name<'d>(extension: &'d TypeExtension<'_, String>) -> &'d str {
    match extension {
        TypeExtension::Scalar(ty) => ty.name.as_str(),
        TypeExtension::Object(ty) => ty.name.as_str(),
        TypeExtension::Interface(ty) => ty.name.as_str(),
        TypeExtension::Union(ty) => ty.name.as_str(),
        TypeExtension::Enum(ty) => ty.name.as_str(),
        TypeExtension::InputObject(ty) => ty.name.as_str(),
    }
}

fn empty_type(kind: TypeKind, name: &str, description: Option<String>) -> FullType {
    FullType {
        kind,
        name: name.to_owned(),
        description,
        fields: None,
        input_fields: None,
        interfaces: None,
        enum_values: None,
        possible_types: None,
    }
}

fn named_ref(kind: TypeKind, name: &str) -> TypeRef {
    TypeRef {
        kind,
        name: Some(name.to_owned()),
        of_type: None,
    }
}

fn enum_values(values: &[ast::EnumValue<'_, String>]) -> Vec<EnumValue> {
    values
        .iter()
        .map(|value| {
            let (is_deprecated, deprecation_reason) = deprecation(&value.directives);
            EnumValue {
                name: value.name.clone(),
                description: value.description.clone(),
                is_deprecated,
                deprecation_reason,
            }
        })
        .collect()
}

fn deprecation(directives: &[ast::Directive<'_, String>]) -> (bool, Option<String>) {
    let Some(deprecated) = directives.iter().find(|d| d.name == "deprecated") else {
        return (false, None);
    };
    let reason = deprecated
        .arguments
        .iter()
        .find_map(|(name, value)| match value {
            Value::String(reason) if name == "reason" => Some(reason.clone()),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_DEPRECATION_REASON.to_owned());
    (true, Some(reason))
}

/// GraphQL literal, as introspection reports `defaultValue`.
fn print_value(value: &Value<'_, String>) -> String {
    match value {
        Value::Variable(name) => format!("${name}"),
        Value::Int(number) => number.as_i64().map(|n| n.to_string()).unwrap_or_default(),
        Value::Float(number) => number.to_string(),
        Value::String(text) => {
            serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
        }
        Value::Boolean(flag) => flag.to_string(),
        Value::Null => "null".to_owned(),
        Value::Enum(name) => name.clone(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(print_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{name}: {}", print_value(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

fn built_in_directives() -> Vec<Directive> {
    const EXECUTABLE: &[&str] = &["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"];
    let default_reason = format!("\"{DEFAULT_DEPRECATION_REASON}\"");

    vec![
        built_in(
            "skip",
            "Directs the executor to skip this field or fragment when the `if` argument is true.",
            EXECUTABLE,
            argument("if", non_null_scalar("Boolean"), None),
        ),
        built_in(
            "include",
            "Directs the executor to include this field or fragment only when the `if` argument is true.",
            EXECUTABLE,
            argument("if", non_null_scalar("Boolean"), None),
        ),
        built_in(
            "deprecated",
            "Marks an element of a GraphQL schema as no longer supported.",
            &[
                "FIELD_DEFINITION",
                "ARGUMENT_DEFINITION",
                "INPUT_FIELD_DEFINITION",
                "ENUM_VALUE",
            ],
            argument(
                "reason",
                named_ref(TypeKind::Scalar, "String"),
                Some(default_reason),
            ),
        ),
        built_in(
            "specifiedBy",
            "Exposes a URL that specifies the behavior of this scalar.",
            &["SCALAR"],
            argument("url", non_null_scalar("String"), None),
        ),
    ]
}

fn built_in(name: &str, description: &str, locations: &[&str], arg: InputValue) -> Directive {
    Directive {
        name: name.to_owned(),
        description: Some(description.to_owned()),
        locations: locations.iter().map(|l| (*l).to_owned()).collect(),
        args: vec![arg],
        is_repeatable: false,
    }
}

fn argument(name: &str, ty: TypeRef, default_value: Option<String>) -> InputValue {
    InputValue {
        name: name.to_owned(),
        description: None,
        ty,
        default_value,
    }
}

fn non_null_scalar(name: &str) -> TypeRef {
    TypeRef {
        kind: TypeKind::NonNull,
        name: None,
        of_type: Some(Box::new(named_ref(TypeKind::Scalar, name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn introspect(sdl: &str) -> IntrospectionSchema {
        introspect_sdl("https://registry.test/graphql", sdl)
            .expect("valid sdl")
            .schema
    }

    fn find<'s>(schema: &'s IntrospectionSchema, name: &str) -> &'s FullType {
        schema
            .types
            .iter()
            .find(|ty| ty.name == name)
            .unwrap_or_else(|| panic!("type {name}"))
    }

    #[test]
    fn conventional_roots_and_built_in_scalars() {
        let schema = introspect("type Query { a: Int }\ntype Mutation { b: Boolean }\n");
        assert_eq!(schema.query_type.as_ref().map(|r| r.name.as_str()), Some("Query"));
        assert_eq!(schema.mutation_type.as_ref().map(|r| r.name.as_str()), Some("Mutation"));
        assert!(schema.subscription_type.is_none());
        for scalar in BUILT_IN_SCALARS {
            assert_eq!(find(&schema, scalar).kind, TypeKind::Scalar);
        }
        let names: Vec<&str> = schema.directives.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["skip", "include", "deprecated", "specifiedBy"]);
    }

    #[test]
    fn schema_definition_names_the_roots() {
        let schema = introspect("schema { query: Root }\ntype Root { a: Int }\ntype Query { b: Int }\n");
        assert_eq!(schema.query_type.as_ref().map(|r| r.name.as_str()), Some("Root"));
        assert!(schema.to_sdl().starts_with("schema {\n  query: Root\n}\n"));
    }

    #[test]
    fn deprecations_and_defaults() {
        let schema = introspect(
            r#"type Query {
  old: Int @deprecated
  older(limit: Int = 10, tag: String = "x", role: Role = ADMIN, ids: [ID] = [1, 2]): Int @deprecated(reason: "Use `new`.")
}
enum Role {
  ADMIN
  GUEST @deprecated(reason: "Gone.")
}
"#,
        );
        let query = find(&schema, "Query");
        let fields = query.fields.as_ref().expect("fields");
        assert!(fields[0].is_deprecated);
        assert_eq!(fields[0].deprecation_reason.as_deref(), Some(DEFAULT_DEPRECATION_REASON));
        assert_eq!(fields[1].deprecation_reason.as_deref(), Some("Use `new`."));
        let defaults: Vec<Option<&str>> = fields[1]
            .args
            .iter()
            .map(|arg| arg.default_value.as_deref())
            .collect();
        assert_eq!(defaults, [Some("10"), Some("\"x\""), Some("ADMIN"), Some("[1, 2]")]);

        let role = find(&schema, "Role");
        let guest = &role.enum_values.as_ref().expect("values")[1];
        assert!(guest.is_deprecated);
        assert_eq!(guest.deprecation_reason.as_deref(), Some("Gone."));
    }

    #[test]
    fn interfaces_list_their_implementations() {
        let schema = introspect(
            "type Query { node: Node }\ninterface Node { id: ID! }\ntype User implements Node { id: ID! }\ntype Team implements Node { id: ID! }\n",
        );
        let node = find(&schema, "Node");
        let possible: Vec<&str> = node
            .possible_types
            .iter()
            .flatten()
            .filter_map(|ty| ty.name.as_deref())
            .collect();
        assert_eq!(possible, ["User", "Team"]);
        let user = find(&schema, "User");
        assert_eq!(user.interfaces.as_ref().expect("interfaces")[0].kind, TypeKind::Interface);
    }

    #[test]
    fn extensions_merge_into_their_definition() {
        let schema = introspect(
            "type Query { a: Int }\nextend type Query { b: String }\nenum E { X }\nextend enum E { Y }\nunion U = Query\ntype Other { c: Int }\nextend union U = Other\n",
        );
        let query: Vec<&str> = find(&schema, "Query")
            .fields
            .iter()
            .flatten()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(query, ["a", "b"]);
        assert_eq!(find(&schema, "E").enum_values.as_ref().map(Vec::len), Some(2));
        assert_eq!(find(&schema, "U").possible_types.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn repeatable_directive_survives_printing() {
        let sdl = "directive @tag(name: String!) repeatable on OBJECT | FIELD_DEFINITION\n\ntype Query {\n  a: Int\n}\n";
        let schema = introspect(sdl);
        let tag = schema.directives.iter().find(|d| d.name == "tag").expect("tag");
        assert!(tag.is_repeatable);
        assert_eq!(schema.to_sdl(), sdl);
    }

    #[test]
    fn wrapped_types_nest_in_of_type() {
        let schema = introspect("type Query { ids: [ID!]! }\n");
        let ty = &find(&schema, "Query").fields.as_ref().expect("fields")[0].ty;
        assert_eq!(ty.kind, TypeKind::NonNull);
        assert_eq!(ty.render(), "[ID!]!");
    }

    #[test]
    fn rejects_unknown_types_and_bad_syntax() {
        for sdl in ["type Query { a: Missing }", "type Query {", "extend type Ghost { a: Int }"] {
            let err = introspect_sdl("https://registry.test/graphql", sdl).unwrap_err();
            assert!(matches!(err, FetchError::InvalidSdl { .. }), "{sdl}: {err:?}");
        }
    }
}
