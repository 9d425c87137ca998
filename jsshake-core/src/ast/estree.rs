//! ESTree JSON lowering.
//!
//! Accepts the JSON produced by acorn, espree, oxc/swc in ESTree mode and
//! babel (`File` wrapper, `StringLiteral`, `ObjectProperty`, ...). Position
//! fields and type annotations are ignored. Input may also be an envelope
//! `{ "ast": <Program>, "metadata": <any> }`; the metadata is stored on the
//! module untouched.

use serde::Deserialize;
use serde_json::Value;

use super::{FnKind, Lit, Module, Node, NodeId, PropKind, VarKind};
use crate::error::{ShakerError, ShakerResult};

type Child = Box<EsNode>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum EsNode {
    File {
        program: Child,
    },
    Program {
        body: Vec<EsNode>,
    },

    ImportDeclaration {
        source: Child,
        #[serde(default)]
        specifiers: Vec<EsNode>,
    },
    ImportSpecifier {
        imported: Child,
        local: Child,
    },
    ImportDefaultSpecifier {
        local: Child,
    },
    ImportNamespaceSpecifier {
        local: Child,
    },
    ExportNamedDeclaration {
        declaration: Option<Child>,
        #[serde(default)]
        specifiers: Vec<EsNode>,
        source: Option<Child>,
    },
    ExportSpecifier {
        local: Child,
        exported: Child,
    },
    ExportNamespaceSpecifier {
        exported: Child,
    },
    ExportDefaultDeclaration {
        declaration: Child,
    },
    ExportAllDeclaration {
        source: Child,
        exported: Option<Child>,
    },

    VariableDeclaration {
        kind: String,
        declarations: Vec<EsNode>,
    },
    VariableDeclarator {
        id: Child,
        init: Option<Child>,
    },
    FunctionDeclaration {
        id: Option<Child>,
        params: Vec<EsNode>,
        body: Child,
        #[serde(rename = "async", default)]
        is_async: bool,
        #[serde(default)]
        generator: bool,
    },
    FunctionExpression {
        id: Option<Child>,
        params: Vec<EsNode>,
        body: Child,
        #[serde(rename = "async", default)]
        is_async: bool,
        #[serde(default)]
        generator: bool,
    },
    ArrowFunctionExpression {
        params: Vec<EsNode>,
        body: Child,
        #[serde(rename = "async", default)]
        is_async: bool,
        #[serde(default)]
        generator: bool,
    },
    ClassDeclaration {
        id: Option<Child>,
        #[serde(rename = "superClass")]
        super_class: Option<Child>,
        body: Child,
    },
    ClassExpression {
        id: Option<Child>,
        #[serde(rename = "superClass")]
        super_class: Option<Child>,
        body: Child,
    },
    ClassBody {
        body: Vec<EsNode>,
    },
    MethodDefinition {
        key: Child,
        value: Child,
        #[serde(default)]
        computed: bool,
        #[serde(rename = "static", default)]
        is_static: bool,
        #[serde(default)]
        kind: String,
    },
    #[serde(alias = "ClassProperty")]
    PropertyDefinition {
        key: Child,
        value: Option<Child>,
        #[serde(default)]
        computed: bool,
        #[serde(rename = "static", default)]
        is_static: bool,
    },
    ClassMethod {
        key: Child,
        params: Vec<EsNode>,
        body: Child,
        #[serde(default)]
        computed: bool,
        #[serde(rename = "static", default)]
        is_static: bool,
        #[serde(default)]
        kind: String,
        #[serde(rename = "async", default)]
        is_async: bool,
        #[serde(default)]
        generator: bool,
    },
    ObjectMethod {
        key: Child,
        params: Vec<EsNode>,
        body: Child,
        #[serde(default)]
        computed: bool,
        #[serde(default)]
        kind: String,
        #[serde(rename = "async", default)]
        is_async: bool,
        #[serde(default)]
        generator: bool,
    },

    ExpressionStatement {
        expression: Child,
    },
    BlockStatement {
        body: Vec<EsNode>,
    },
    ReturnStatement {
        argument: Option<Child>,
    },
    IfStatement {
        test: Child,
        consequent: Child,
        alternate: Option<Child>,
    },
    ThrowStatement {
        argument: Child,
    },
    ForStatement {
        init: Option<Child>,
        test: Option<Child>,
        update: Option<Child>,
        body: Child,
    },
    ForInStatement {
        left: Child,
        right: Child,
        body: Child,
    },
    ForOfStatement {
        left: Child,
        right: Child,
        body: Child,
        #[serde(rename = "await", default)]
        is_await: bool,
    },
    WhileStatement {
        test: Child,
        body: Child,
    },
    DoWhileStatement {
        body: Child,
        test: Child,
    },
    TryStatement {
        block: Child,
        handler: Option<Child>,
        finalizer: Option<Child>,
    },
    CatchClause {
        param: Option<Child>,
        body: Child,
    },
    SwitchStatement {
        discriminant: Child,
        cases: Vec<EsNode>,
    },
    SwitchCase {
        test: Option<Child>,
        consequent: Vec<EsNode>,
    },
    LabeledStatement {
        label: Child,
        body: Child,
    },
    BreakStatement {
        label: Option<Child>,
    },
    ContinueStatement {
        label: Option<Child>,
    },
    DebuggerStatement {},
    EmptyStatement {},

    Identifier {
        name: String,
    },
    Literal {
        #[serde(default)]
        value: Value,
        regex: Option<RegexInfo>,
    },
    StringLiteral {
        value: String,
    },
    NumericLiteral {
        value: f64,
    },
    BooleanLiteral {
        value: bool,
    },
    NullLiteral {},
    RegExpLiteral {
        pattern: String,
        #[serde(default)]
        flags: String,
    },
    TemplateLiteral {
        quasis: Vec<EsNode>,
        expressions: Vec<EsNode>,
    },
    TemplateElement {
        value: TemplateValue,
    },
    TaggedTemplateExpression {
        tag: Child,
        quasi: Child,
    },
    ThisExpression {},
    Super {},
    MetaProperty {
        meta: Child,
        property: Child,
    },
    ImportExpression {
        source: Child,
    },
    /// Babel's callee for `import(…)`.
    Import {},
    MemberExpression {
        object: Child,
        property: Child,
        #[serde(default)]
        computed: bool,
        #[serde(default)]
        optional: bool,
    },
    CallExpression {
        callee: Child,
        #[serde(default)]
        arguments: Vec<EsNode>,
        #[serde(default)]
        optional: bool,
    },
    /// Babel models optional chains without a wrapper node; the outermost
    /// `Optional*` node ends the chain.
    OptionalMemberExpression {
        object: Child,
        property: Child,
        #[serde(default)]
        computed: bool,
        #[serde(default)]
        optional: bool,
    },
    OptionalCallExpression {
        callee: Child,
        #[serde(default)]
        arguments: Vec<EsNode>,
        #[serde(default)]
        optional: bool,
    },
    NewExpression {
        callee: Child,
        #[serde(default)]
        arguments: Vec<EsNode>,
    },
    AssignmentExpression {
        operator: String,
        left: Child,
        right: Child,
    },
    #[serde(alias = "LogicalExpression")]
    BinaryExpression {
        operator: String,
        left: Child,
        right: Child,
    },
    UnaryExpression {
        operator: String,
        argument: Child,
    },
    UpdateExpression {
        operator: String,
        prefix: bool,
        argument: Child,
    },
    AwaitExpression {
        argument: Child,
    },
    YieldExpression {
        argument: Option<Child>,
        #[serde(default)]
        delegate: bool,
    },
    ConditionalExpression {
        test: Child,
        consequent: Child,
        alternate: Child,
    },
    SequenceExpression {
        expressions: Vec<EsNode>,
    },
    ArrayExpression {
        elements: Vec<Option<EsNode>>,
    },
    ObjectExpression {
        properties: Vec<EsNode>,
    },
    #[serde(alias = "ObjectProperty")]
    Property {
        key: Child,
        value: Child,
        #[serde(default)]
        computed: bool,
        #[serde(default)]
        shorthand: bool,
        #[serde(default)]
        kind: String,
    },
    SpreadElement {
        argument: Child,
    },
    ObjectPattern {
        properties: Vec<EsNode>,
    },
    ArrayPattern {
        elements: Vec<Option<EsNode>>,
    },
    AssignmentPattern {
        left: Child,
        right: Child,
    },
    RestElement {
        argument: Child,
    },
    ParenthesizedExpression {
        expression: Child,
    },
    ChainExpression {
        expression: Child,
    },
}

#[derive(Debug, Deserialize)]
struct RegexInfo {
    pattern: String,
    #[serde(default)]
    flags: String,
}

#[derive(Debug, Deserialize)]
struct TemplateValue {
    raw: String,
}

/// Lowers an ESTree JSON document into a [`Module`].
pub fn module_from_estree(json: &str, filename: &str) -> ShakerResult<Module> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ShakerError::ast(format!("{}: invalid JSON: {}", filename, e)))?;
    module_from_value(value, filename)
}

/// Same as [`module_from_estree`] for an already-parsed JSON value.
pub fn module_from_value(mut value: Value, filename: &str) -> ShakerResult<Module> {
    let mut metadata = None;
    if value.get("type").is_none() {
        if let Some(obj) = value.as_object_mut() {
            metadata = obj.remove("metadata").filter(|m| !m.is_null());
            value = obj
                .remove("ast")
                .ok_or_else(|| ShakerError::ast(format!("{}: expected an ESTree node or an \"ast\" envelope", filename)))?;
        }
    }

    let root: EsNode = serde_json::from_value(value)
        .map_err(|e| ShakerError::ast(format!("{}: {}", filename, e)))?;

    let body = match root {
        EsNode::File { program } => match *program {
            EsNode::Program { body } => body,
            _ => return Err(ShakerError::ast("File.program is not a Program")),
        },
        EsNode::Program { body } => body,
        _ => return Err(ShakerError::ast("root node must be a Program")),
    };

    let mut lower = Lowering {
        module: Module::new(filename),
    };
    for stmt in body {
        let id = lower.lower(stmt)?;
        lower.module.append(id);
    }

    let mut module = lower.module;
    module.metadata = metadata;
    Ok(module)
}

/// Name carried by an identifier or string literal (`import { "a-b" as x }`).
fn name_of(node: &EsNode) -> ShakerResult<String> {
    match node {
        EsNode::Identifier { name } => Ok(name.clone()),
        EsNode::StringLiteral { value } => Ok(value.clone()),
        EsNode::Literal {
            value: Value::String(s),
            ..
        } => Ok(s.clone()),
        other => Err(ShakerError::ast(format!("expected a name, found {:?}", kind_of(other)))),
    }
}

fn kind_of(node: &EsNode) -> String {
    let debug = format!("{:?}", node);
    debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_string()
}

struct Lowering {
    module: Module,
}

/// Function header flags carried from the ESTree node.
#[derive(Debug, Clone, Copy, Default)]
struct FnFlags {
    is_async: bool,
    is_generator: bool,
}

impl FnFlags {
    fn new(is_async: bool, is_generator: bool) -> Self {
        Self { is_async, is_generator }
    }
}

fn prop_kind(kind: &str) -> ShakerResult<PropKind> {
    match kind {
        "" | "init" | "method" | "constructor" => Ok(PropKind::Init),
        "get" => Ok(PropKind::Get),
        "set" => Ok(PropKind::Set),
        other => Err(ShakerError::ast(format!("unsupported property kind `{}`", other))),
    }
}

impl Lowering {
    fn alloc(&mut self, node: Node) -> NodeId {
        self.module.alloc(node)
    }

    fn ident(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(Node::Ident { name: name.into() })
    }

    fn lower_all(&mut self, nodes: Vec<EsNode>) -> ShakerResult<Vec<NodeId>> {
        nodes.into_iter().map(|n| self.lower(n)).collect()
    }

    fn lower_opt(&mut self, node: Option<Child>) -> ShakerResult<Option<NodeId>> {
        node.map(|n| self.lower(*n)).transpose()
    }

    fn lower_holes(&mut self, elements: Vec<Option<EsNode>>) -> ShakerResult<Vec<NodeId>> {
        elements
            .into_iter()
            .map(|e| match e {
                Some(e) => self.lower(e),
                None => Ok(self.alloc(Node::Empty)),
            })
            .collect()
    }

    fn label(label: Option<Child>) -> ShakerResult<Option<String>> {
        label.map(|l| name_of(&l)).transpose()
    }

    fn block(&mut self, body: Child) -> ShakerResult<NodeId> {
        match *body {
            EsNode::BlockStatement { body } => {
                let body = self.lower_all(body)?;
                Ok(self.alloc(Node::Block { body }))
            }
            other => self.lower(other),
        }
    }

    fn function(
        &mut self,
        kind: FnKind,
        id: Option<Child>,
        params: Vec<EsNode>,
        body: Child,
        flags: FnFlags,
    ) -> ShakerResult<NodeId> {
        let id = self.lower_opt(id)?;
        let params = self.lower_all(params)?;
        let body = self.block(body)?;
        Ok(self.alloc(Node::Function {
            kind,
            id,
            params,
            body,
            is_async: flags.is_async,
            is_generator: flags.is_generator,
        }))
    }

    fn class(
        &mut self,
        id: Option<Child>,
        super_class: Option<Child>,
        body: Child,
        is_declaration: bool,
    ) -> ShakerResult<NodeId> {
        let id = self.lower_opt(id)?;
        let super_class = self.lower_opt(super_class)?;
        let members = match *body {
            EsNode::ClassBody { body } => self.lower_all(body)?,
            _ => return Err(ShakerError::ast("class body is not a ClassBody")),
        };
        Ok(self.alloc(Node::Class {
            id,
            super_class,
            members,
            is_declaration,
        }))
    }

    fn member(&mut self, object: NodeId, property: Child, computed: bool, optional: bool) -> ShakerResult<NodeId> {
        let property = self.lower(*property)?;
        Ok(self.alloc(Node::Member {
            object,
            property,
            computed,
            optional,
        }))
    }

    fn finish_call(&mut self, callee: NodeId, arguments: Vec<EsNode>, optional: bool) -> ShakerResult<NodeId> {
        let args = self.lower_all(arguments)?;
        Ok(self.alloc(Node::Call {
            callee,
            args,
            is_new: false,
            optional,
        }))
    }

    /// Babel spells `import(source)` as a call with an `Import` callee.
    fn import_call(&mut self, arguments: Vec<EsNode>) -> ShakerResult<NodeId> {
        let mut args = self.lower_all(arguments)?;
        if args.len() != 1 {
            return Err(ShakerError::ast("import() takes exactly one argument"));
        }
        let source = args.remove(0);
        Ok(self.alloc(Node::ImportCall { source }))
    }

    /// Lowers one link of a babel optional chain without closing it.
    fn chain_link(&mut self, node: EsNode) -> ShakerResult<NodeId> {
        match node {
            EsNode::OptionalMemberExpression {
                object,
                property,
                computed,
                optional,
            } => {
                let object = self.chain_link(*object)?;
                self.member(object, property, computed, optional)
            }
            EsNode::OptionalCallExpression {
                callee,
                arguments,
                optional,
            } => {
                let callee = self.chain_link(*callee)?;
                self.finish_call(callee, arguments, optional)
            }
            other => self.lower(other),
        }
    }

    fn lower(&mut self, node: EsNode) -> ShakerResult<NodeId> {
        let id = match node {
            EsNode::File { .. } | EsNode::Program { .. } => {
                return Err(ShakerError::ast("nested Program node"));
            }

            EsNode::ImportDeclaration { source, specifiers } => {
                let source = name_of(&source)?;
                let specifiers = self.lower_all(specifiers)?;
                self.alloc(Node::Import { source, specifiers })
            }
            EsNode::ImportSpecifier { imported, local } => {
                let imported = name_of(&imported)?;
                let local = self.lower(*local)?;
                self.alloc(Node::ImportSpecifier { imported, local })
            }
            EsNode::ImportDefaultSpecifier { local } => {
                let local = self.lower(*local)?;
                self.alloc(Node::ImportSpecifier {
                    imported: "default".to_string(),
                    local,
                })
            }
            EsNode::ImportNamespaceSpecifier { local } => {
                let local = self.lower(*local)?;
                self.alloc(Node::ImportNamespace { local })
            }
            EsNode::ExportNamedDeclaration {
                declaration,
                specifiers,
                source,
            } => {
                let declaration = self.lower_opt(declaration)?;
                let specifiers = self.lower_all(specifiers)?;
                let source = source.map(|s| name_of(&s)).transpose()?;
                self.alloc(Node::ExportNamed {
                    declaration,
                    specifiers,
                    source,
                })
            }
            EsNode::ExportSpecifier { local, exported } => {
                let local = name_of(&local)?;
                let local = self.ident(local);
                let exported = name_of(&exported)?;
                self.alloc(Node::ExportSpecifier { local, exported })
            }
            EsNode::ExportNamespaceSpecifier { exported } => {
                let exported = name_of(&exported)?;
                self.alloc(Node::ExportNamespace { exported })
            }
            EsNode::ExportDefaultDeclaration { declaration } => {
                let value = match *declaration {
                    EsNode::FunctionDeclaration {
                        id,
                        params,
                        body,
                        is_async,
                        generator,
                    } => self.function(
                        FnKind::Declaration,
                        id,
                        params,
                        body,
                        FnFlags::new(is_async, generator),
                    )?,
                    EsNode::ClassDeclaration { id, super_class, body } => {
                        self.class(id, super_class, body, true)?
                    }
                    other => self.lower(other)?,
                };
                self.alloc(Node::ExportDefault { value })
            }
            EsNode::ExportAllDeclaration { source, exported } => {
                let source = name_of(&source)?;
                match exported {
                    None => self.alloc(Node::ExportAll { source }),
                    Some(exported) => {
                        let exported = name_of(&exported)?;
                        let spec = self.alloc(Node::ExportNamespace { exported });
                        self.alloc(Node::ExportNamed {
                            declaration: None,
                            specifiers: vec![spec],
                            source: Some(source),
                        })
                    }
                }
            }

            EsNode::VariableDeclaration { kind, declarations } => {
                let kind = match kind.as_str() {
                    "var" => VarKind::Var,
                    "let" => VarKind::Let,
                    "const" => VarKind::Const,
                    other => return Err(ShakerError::ast(format!("unsupported declaration kind `{}`", other))),
                };
                let declarators = self.lower_all(declarations)?;
                self.alloc(Node::VarDecl { kind, declarators })
            }
            EsNode::VariableDeclarator { id, init } => {
                let id = self.lower(*id)?;
                let init = self.lower_opt(init)?;
                self.alloc(Node::Declarator { id, init })
            }
            EsNode::FunctionDeclaration {
                id,
                params,
                body,
                is_async,
                generator,
            } => self.function(
                FnKind::Declaration,
                id,
                params,
                body,
                FnFlags::new(is_async, generator),
            )?,
            EsNode::FunctionExpression {
                id,
                params,
                body,
                is_async,
                generator,
            } => self.function(
                FnKind::Expression,
                id,
                params,
                body,
                FnFlags::new(is_async, generator),
            )?,
            EsNode::ArrowFunctionExpression {
                params,
                body,
                is_async,
                generator,
            } => self.function(FnKind::Arrow, None, params, body, FnFlags::new(is_async, generator))?,
            EsNode::ClassDeclaration { id, super_class, body } => self.class(id, super_class, body, true)?,
            EsNode::ClassExpression { id, super_class, body } => self.class(id, super_class, body, false)?,
            EsNode::ClassBody { .. } => return Err(ShakerError::ast("stray ClassBody")),
            EsNode::MethodDefinition {
                key,
                value,
                computed,
                is_static,
                kind,
            } => {
                let kind = prop_kind(&kind)?;
                let key = self.lower(*key)?;
                let value = self.lower(*value)?;
                self.alloc(Node::ClassMember {
                    key,
                    value: Some(value),
                    computed,
                    is_static,
                    is_method: true,
                    kind,
                })
            }
            EsNode::PropertyDefinition {
                key,
                value,
                computed,
                is_static,
            } => {
                let key = self.lower(*key)?;
                let value = self.lower_opt(value)?;
                self.alloc(Node::ClassMember {
                    key,
                    value,
                    computed,
                    is_static,
                    is_method: false,
                    kind: PropKind::Init,
                })
            }
            EsNode::ClassMethod {
                key,
                params,
                body,
                computed,
                is_static,
                kind,
                is_async,
                generator,
            } => {
                let kind = prop_kind(&kind)?;
                let key = self.lower(*key)?;
                let value = self.function(
                    FnKind::Expression,
                    None,
                    params,
                    body,
                    FnFlags::new(is_async, generator),
                )?;
                self.alloc(Node::ClassMember {
                    key,
                    value: Some(value),
                    computed,
                    is_static,
                    is_method: true,
                    kind,
                })
            }
            EsNode::ObjectMethod {
                key,
                params,
                body,
                computed,
                kind,
                is_async,
                generator,
            } => {
                let kind = prop_kind(&kind)?;
                let key = self.lower(*key)?;
                let value = self.function(
                    FnKind::Expression,
                    None,
                    params,
                    body,
                    FnFlags::new(is_async, generator),
                )?;
                self.alloc(Node::Property {
                    key,
                    value,
                    computed,
                    shorthand: false,
                    kind,
                })
            }

            EsNode::ExpressionStatement { expression } => {
                let expr = self.lower(*expression)?;
                self.alloc(Node::ExprStmt { expr })
            }
            EsNode::BlockStatement { body } => {
                let body = self.lower_all(body)?;
                self.alloc(Node::Block { body })
            }
            EsNode::ReturnStatement { argument } => {
                let arg = self.lower_opt(argument)?;
                self.alloc(Node::Return { arg })
            }
            EsNode::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                let test = self.lower(*test)?;
                let cons = self.lower(*consequent)?;
                let alt = self.lower_opt(alternate)?;
                self.alloc(Node::If { test, cons, alt })
            }
            EsNode::ThrowStatement { argument } => {
                let arg = self.lower(*argument)?;
                self.alloc(Node::Throw { arg })
            }
            EsNode::ForStatement {
                init,
                test,
                update,
                body,
            } => {
                let init = self.lower_opt(init)?;
                let test = self.lower_opt(test)?;
                let update = self.lower_opt(update)?;
                let body = self.lower(*body)?;
                self.alloc(Node::For {
                    init,
                    test,
                    update,
                    body,
                })
            }
            EsNode::ForInStatement { left, right, body } => {
                let left = self.lower(*left)?;
                let right = self.lower(*right)?;
                let body = self.lower(*body)?;
                self.alloc(Node::ForIn {
                    left,
                    right,
                    body,
                    of: false,
                    is_await: false,
                })
            }
            EsNode::ForOfStatement {
                left,
                right,
                body,
                is_await,
            } => {
                let left = self.lower(*left)?;
                let right = self.lower(*right)?;
                let body = self.lower(*body)?;
                self.alloc(Node::ForIn {
                    left,
                    right,
                    body,
                    of: true,
                    is_await,
                })
            }
            EsNode::WhileStatement { test, body } => {
                let test = self.lower(*test)?;
                let body = self.lower(*body)?;
                self.alloc(Node::While { test, body })
            }
            EsNode::DoWhileStatement { body, test } => {
                let body = self.lower(*body)?;
                let test = self.lower(*test)?;
                self.alloc(Node::DoWhile { body, test })
            }
            EsNode::TryStatement {
                block,
                handler,
                finalizer,
            } => {
                let block = self.block(block)?;
                let handler = self.lower_opt(handler)?;
                let finalizer = finalizer.map(|f| self.block(f)).transpose()?;
                self.alloc(Node::Try {
                    block,
                    handler,
                    finalizer,
                })
            }
            EsNode::CatchClause { param, body } => {
                let param = self.lower_opt(param)?;
                let body = self.block(body)?;
                self.alloc(Node::Catch { param, body })
            }
            EsNode::SwitchStatement { discriminant, cases } => {
                let discriminant = self.lower(*discriminant)?;
                let cases = self.lower_all(cases)?;
                self.alloc(Node::Switch { discriminant, cases })
            }
            EsNode::SwitchCase { test, consequent } => {
                let test = self.lower_opt(test)?;
                let body = self.lower_all(consequent)?;
                self.alloc(Node::SwitchCase { test, body })
            }
            EsNode::LabeledStatement { label, body } => {
                let label = name_of(&label)?;
                let body = self.lower(*body)?;
                self.alloc(Node::Labeled { label, body })
            }
            EsNode::BreakStatement { label } => {
                let label = Self::label(label)?;
                self.alloc(Node::Break { label })
            }
            EsNode::ContinueStatement { label } => {
                let label = Self::label(label)?;
                self.alloc(Node::Continue { label })
            }
            EsNode::DebuggerStatement {} => self.alloc(Node::Debugger),
            EsNode::EmptyStatement {} => self.alloc(Node::Empty),

            EsNode::Identifier { name } => self.ident(name),
            EsNode::Literal { regex: Some(regex), .. } => self.regexp(regex.pattern, regex.flags),
            EsNode::Literal { value, .. } => {
                let lit = match value {
                    Value::String(s) => Lit::Str(s),
                    Value::Number(n) => Lit::Num(n.as_f64().unwrap_or(f64::NAN)),
                    Value::Bool(b) => Lit::Bool(b),
                    Value::Null => Lit::Null,
                    other => return Err(ShakerError::ast(format!("unsupported literal {}", other))),
                };
                self.alloc(Node::Lit(lit))
            }
            EsNode::StringLiteral { value } => self.alloc(Node::Lit(Lit::Str(value))),
            EsNode::NumericLiteral { value } => self.alloc(Node::Lit(Lit::Num(value))),
            EsNode::BooleanLiteral { value } => self.alloc(Node::Lit(Lit::Bool(value))),
            EsNode::NullLiteral {} => self.alloc(Node::Lit(Lit::Null)),
            EsNode::RegExpLiteral { pattern, flags } => self.regexp(pattern, flags),
            EsNode::TemplateLiteral { quasis, expressions } => {
                let quasis = quasis
                    .into_iter()
                    .map(|q| match q {
                        EsNode::TemplateElement { value } => Ok(value.raw),
                        other => Err(ShakerError::ast(format!("expected a TemplateElement, found {}", kind_of(&other)))),
                    })
                    .collect::<ShakerResult<Vec<_>>>()?;
                if quasis.len() != expressions.len() + 1 {
                    return Err(ShakerError::ast("template literal quasis do not surround its expressions"));
                }
                let exprs = self.lower_all(expressions)?;
                self.alloc(Node::Template { quasis, exprs })
            }
            EsNode::TemplateElement { .. } => return Err(ShakerError::ast("stray TemplateElement")),
            EsNode::TaggedTemplateExpression { tag, quasi } => {
                let tag = self.lower(*tag)?;
                let quasi = self.lower(*quasi)?;
                self.alloc(Node::TaggedTemplate { tag, quasi })
            }
            EsNode::ThisExpression {} => self.alloc(Node::This),
            EsNode::Super {} => self.alloc(Node::Super),
            EsNode::MetaProperty { meta, property } => {
                let meta = name_of(&meta)?;
                let property = name_of(&property)?;
                self.alloc(Node::MetaProperty { meta, property })
            }
            EsNode::ImportExpression { source } => {
                let source = self.lower(*source)?;
                self.alloc(Node::ImportCall { source })
            }
            EsNode::Import {} => return Err(ShakerError::ast("stray Import callee")),
            EsNode::MemberExpression {
                object,
                property,
                computed,
                optional,
            } => {
                let object = self.lower(*object)?;
                self.member(object, property, computed, optional)?
            }
            EsNode::CallExpression {
                callee,
                arguments,
                optional,
            } => match *callee {
                EsNode::Import {} => self.import_call(arguments)?,
                callee => {
                    let callee = self.lower(callee)?;
                    self.finish_call(callee, arguments, optional)?
                }
            },
            chain @ (EsNode::OptionalMemberExpression { .. } | EsNode::OptionalCallExpression { .. }) => {
                let expr = self.chain_link(chain)?;
                self.alloc(Node::Chain { expr })
            }
            EsNode::NewExpression { callee, arguments } => {
                let callee = self.lower(*callee)?;
                let args = self.lower_all(arguments)?;
                self.alloc(Node::Call {
                    callee,
                    args,
                    is_new: true,
                    optional: false,
                })
            }
            EsNode::AssignmentExpression { operator, left, right } => {
                let target = self.lower(*left)?;
                let value = self.lower(*right)?;
                self.alloc(Node::Assign {
                    op: operator,
                    target,
                    value,
                })
            }
            EsNode::BinaryExpression { operator, left, right } => {
                let left = self.lower(*left)?;
                let right = self.lower(*right)?;
                self.alloc(Node::Binary {
                    op: operator,
                    left,
                    right,
                })
            }
            EsNode::UnaryExpression { operator, argument } => {
                let arg = self.lower(*argument)?;
                self.alloc(Node::Unary { op: operator, arg })
            }
            EsNode::UpdateExpression {
                operator,
                prefix,
                argument,
            } => {
                let arg = self.lower(*argument)?;
                self.alloc(Node::Update {
                    op: operator,
                    prefix,
                    arg,
                })
            }
            EsNode::AwaitExpression { argument } => {
                let arg = self.lower(*argument)?;
                self.alloc(Node::Await { arg })
            }
            EsNode::YieldExpression { argument, delegate } => {
                let arg = self.lower_opt(argument)?;
                self.alloc(Node::Yield { arg, delegate })
            }
            EsNode::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                let test = self.lower(*test)?;
                let cons = self.lower(*consequent)?;
                let alt = self.lower(*alternate)?;
                self.alloc(Node::Cond { test, cons, alt })
            }
            EsNode::SequenceExpression { expressions } => {
                let exprs = self.lower_all(expressions)?;
                self.alloc(Node::Seq { exprs })
            }
            EsNode::ArrayExpression { elements } => {
                let elems = self.lower_holes(elements)?;
                self.alloc(Node::Array { elems })
            }
            EsNode::ObjectExpression { properties } => {
                let props = self.lower_all(properties)?;
                self.alloc(Node::Object { props })
            }
            EsNode::Property {
                key,
                value,
                computed,
                shorthand,
                kind,
            } => {
                let kind = prop_kind(&kind)?;
                let key = self.lower(*key)?;
                let value = self.lower(*value)?;
                self.alloc(Node::Property {
                    key,
                    value,
                    computed,
                    shorthand,
                    kind,
                })
            }
            EsNode::SpreadElement { argument } => {
                let arg = self.lower(*argument)?;
                self.alloc(Node::Spread { arg })
            }
            EsNode::ObjectPattern { properties } => {
                let props = self.lower_all(properties)?;
                self.alloc(Node::ObjectPattern { props })
            }
            EsNode::ArrayPattern { elements } => {
                let elems = self.lower_holes(elements)?;
                self.alloc(Node::ArrayPattern { elems })
            }
            EsNode::AssignmentPattern { left, right } => {
                let target = self.lower(*left)?;
                let default = self.lower(*right)?;
                self.alloc(Node::AssignPattern { target, default })
            }
            EsNode::RestElement { argument } => {
                let arg = self.lower(*argument)?;
                self.alloc(Node::Rest { arg })
            }
            EsNode::ParenthesizedExpression { expression } => self.lower(*expression)?,
            EsNode::ChainExpression { expression } => {
                let expr = self.lower(*expression)?;
                self.alloc(Node::Chain { expr })
            }
        };
        Ok(id)
    }

    /// Regex literals become `new RegExp(pattern, flags)`.
    fn regexp(&mut self, pattern: String, flags: String) -> NodeId {
        let callee = self.ident("RegExp");
        let pattern = self.alloc(Node::Lit(Lit::Str(pattern)));
        let flags = self.alloc(Node::Lit(Lit::Str(flags)));
        self.alloc(Node::Call {
            callee,
            args: vec![pattern, flags],
            is_new: true,
            optional: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::print_module;

    #[test]
    fn test_lower_acorn_style_module() {
        let json = r#"{
            "type": "Program",
            "sourceType": "module",
            "body": [
                {
                    "type": "ImportDeclaration",
                    "specifiers": [
                        {"type": "ImportDefaultSpecifier", "local": {"type": "Identifier", "name": "dep"}}
                    ],
                    "source": {"type": "Literal", "value": "./dep", "raw": "'./dep'"}
                },
                {
                    "type": "ExportNamedDeclaration",
                    "declaration": {
                        "type": "VariableDeclaration",
                        "kind": "const",
                        "declarations": [{
                            "type": "VariableDeclarator",
                            "id": {"type": "Identifier", "name": "a"},
                            "init": {"type": "Literal", "value": 1, "raw": "1"}
                        }]
                    },
                    "specifiers": [],
                    "source": null
                }
            ]
        }"#;

        let module = module_from_estree(json, "a.js").unwrap();
        assert_eq!(
            print_module(&module),
            "import dep from \"./dep\";\nexport const a = 1;\n"
        );
    }

    #[test]
    fn test_lower_babel_file_and_envelope() {
        let json = r#"{
            "ast": {
                "type": "File",
                "program": {
                    "type": "Program",
                    "body": [{
                        "type": "ExpressionStatement",
                        "expression": {
                            "type": "CallExpression",
                            "callee": {"type": "Identifier", "name": "require"},
                            "arguments": [{"type": "StringLiteral", "value": "./side"}]
                        }
                    }]
                }
            },
            "metadata": {"className": "a1b2"}
        }"#;

        let module = module_from_estree(json, "b.js").unwrap();
        assert_eq!(print_module(&module), "require(\"./side\");\n");
        assert_eq!(module.metadata.unwrap()["className"], "a1b2");
    }

    #[test]
    fn test_lower_array_holes_and_template() {
        let json = r#"{
            "type": "Program",
            "body": [{
                "type": "VariableDeclaration",
                "kind": "let",
                "declarations": [{
                    "type": "VariableDeclarator",
                    "id": {"type": "ArrayPattern", "elements": [null, {"type": "Identifier", "name": "b"}]},
                    "init": {
                        "type": "TemplateLiteral",
                        "quasis": [
                            {"type": "TemplateElement", "value": {"cooked": "x", "raw": "x"}},
                            {"type": "TemplateElement", "value": {"cooked": "", "raw": ""}}
                        ],
                        "expressions": [{"type": "Identifier", "name": "y"}]
                    }
                }]
            }]
        }"#;

        let module = module_from_estree(json, "c.js").unwrap();
        assert_eq!(print_module(&module), "let [, b] = `x${y}`;\n");
    }

    fn program(body: &str) -> String {
        format!(r#"{{"type": "Program", "body": [{}]}}"#, body)
    }

    fn ident(name: &str) -> String {
        format!(r#"{{"type": "Identifier", "name": "{}"}}"#, name)
    }

    fn expr_stmt(expr: &str) -> String {
        format!(r#"{{"type": "ExpressionStatement", "expression": {}}}"#, expr)
    }

    fn call(callee: &str, args: &[String]) -> String {
        format!(
            r#"{{"type": "CallExpression", "callee": {}, "arguments": [{}]}}"#,
            callee,
            args.join(", ")
        )
    }

    fn block(body: &[String]) -> String {
        format!(r#"{{"type": "BlockStatement", "body": [{}]}}"#, body.join(", "))
    }

    #[test]
    fn test_lower_async_generator_and_optional_chain() {
        // export async function f() { return o?.b; }
        let member = format!(
            r#"{{"type": "MemberExpression", "object": {}, "property": {}, "computed": false, "optional": true}}"#,
            ident("o"),
            ident("b")
        );
        let ret = format!(
            r#"{{"type": "ReturnStatement", "argument": {{"type": "ChainExpression", "expression": {}}}}}"#,
            member
        );
        let f = format!(
            r#"{{"type": "FunctionDeclaration", "id": {}, "params": [], "body": {}, "async": true, "generator": false}}"#,
            ident("f"),
            block(&[ret])
        );
        let export = format!(
            r#"{{"type": "ExportNamedDeclaration", "declaration": {}, "specifiers": [], "source": null}}"#,
            f
        );

        // function* g() { yield* h(); }
        let yield_expr = format!(
            r#"{{"type": "YieldExpression", "argument": {}, "delegate": true}}"#,
            call(&ident("h"), &[])
        );
        let g = format!(
            r#"{{"type": "FunctionDeclaration", "id": {}, "params": [], "body": {}, "generator": true}}"#,
            ident("g"),
            block(&[expr_stmt(&yield_expr)])
        );

        // const run = async () => await p?.();
        let optional_call = format!(
            r#"{{"type": "ChainExpression", "expression": {{"type": "CallExpression", "callee": {}, "arguments": [], "optional": true}}}}"#,
            ident("p")
        );
        let arrow = format!(
            r#"{{"type": "ArrowFunctionExpression", "params": [], "body": {{"type": "AwaitExpression", "argument": {}}}, "async": true, "expression": true}}"#,
            optional_call
        );
        let run = format!(
            r#"{{"type": "VariableDeclaration", "kind": "const", "declarations": [{{"type": "VariableDeclarator", "id": {}, "init": {}}}]}}"#,
            ident("run"),
            arrow
        );

        let json = program(&[export, g, run].join(", "));
        let module = module_from_estree(&json, "async.js").unwrap();
        assert_eq!(
            print_module(&module),
            "export async function f() {\n  return o?.b;\n}\n\
             function* g() {\n  yield* h();\n}\n\
             const run = async () => await p?.();\n"
        );
    }

    #[test]
    fn test_babel_optional_chain_keeps_its_boundary() {
        // (a?.b).c;  a?.b.c;
        let link = format!(
            r#"{{"type": "OptionalMemberExpression", "object": {}, "property": {}, "computed": false, "optional": true}}"#,
            ident("a"),
            ident("b")
        );
        let closed = format!(
            r#"{{"type": "MemberExpression", "object": {}, "property": {}, "computed": false}}"#,
            link,
            ident("c")
        );
        let continued = format!(
            r#"{{"type": "OptionalMemberExpression", "object": {}, "property": {}, "computed": false, "optional": false}}"#,
            link,
            ident("c")
        );

        let json = program(&[expr_stmt(&closed), expr_stmt(&continued)].join(", "));
        let module = module_from_estree(&json, "chain.js").unwrap();
        assert_eq!(print_module(&module), "(a?.b).c;\na?.b.c;\n");
    }

    #[test]
    fn test_lower_loops() {
        // for (let i = 0; i < n; i++) {}
        let init = format!(
            r#"{{"type": "VariableDeclaration", "kind": "let", "declarations": [{{"type": "VariableDeclarator", "id": {}, "init": {{"type": "Literal", "value": 0}}}}]}}"#,
            ident("i")
        );
        let test = format!(
            r#"{{"type": "BinaryExpression", "operator": "<", "left": {}, "right": {}}}"#,
            ident("i"),
            ident("n")
        );
        let update = format!(
            r#"{{"type": "UpdateExpression", "operator": "++", "prefix": false, "argument": {}}}"#,
            ident("i")
        );
        let for_stmt = format!(
            r#"{{"type": "ForStatement", "init": {}, "test": {}, "update": {}, "body": {}}}"#,
            init,
            test,
            update,
            block(&[])
        );

        // for (;;) {}
        let forever = format!(
            r#"{{"type": "ForStatement", "init": null, "test": null, "update": null, "body": {}}}"#,
            block(&[])
        );

        // for (const k of list) use(k);
        let left = format!(
            r#"{{"type": "VariableDeclaration", "kind": "const", "declarations": [{{"type": "VariableDeclarator", "id": {}, "init": null}}]}}"#,
            ident("k")
        );
        let for_of = format!(
            r#"{{"type": "ForOfStatement", "left": {}, "right": {}, "body": {}, "await": false}}"#,
            left,
            ident("list"),
            expr_stmt(&call(&ident("use"), &[ident("k")]))
        );

        // for (key in obj) {}
        let for_in = format!(
            r#"{{"type": "ForInStatement", "left": {}, "right": {}, "body": {}}}"#,
            ident("key"),
            ident("obj"),
            block(&[])
        );

        // while (x) step();  do {} while (y);
        let while_stmt = format!(
            r#"{{"type": "WhileStatement", "test": {}, "body": {}}}"#,
            ident("x"),
            expr_stmt(&call(&ident("step"), &[]))
        );
        let do_while = format!(
            r#"{{"type": "DoWhileStatement", "body": {}, "test": {}}}"#,
            block(&[]),
            ident("y")
        );

        let json = program(&[for_stmt, forever, for_of, for_in, while_stmt, do_while].join(", "));
        let module = module_from_estree(&json, "loops.js").unwrap();
        assert_eq!(
            print_module(&module),
            "for (let i = 0; i < n; i++) {}\n\
             for (;;) {}\n\
             for (const k of list) use(k);\n\
             for (key in obj) {}\n\
             while (x) step();\n\
             do {} while (y);\n"
        );
    }

    #[test]
    fn test_lower_try_switch_and_labels() {
        // try {} catch (e) { report(e); } finally { done(); }
        let handler = format!(
            r#"{{"type": "CatchClause", "param": {}, "body": {}}}"#,
            ident("e"),
            block(&[expr_stmt(&call(&ident("report"), &[ident("e")]))])
        );
        let try_stmt = format!(
            r#"{{"type": "TryStatement", "block": {}, "handler": {}, "finalizer": {}}}"#,
            block(&[]),
            handler,
            block(&[expr_stmt(&call(&ident("done"), &[]))])
        );

        // try {} catch {}
        let bare_catch = format!(
            r#"{{"type": "TryStatement", "block": {}, "handler": {{"type": "CatchClause", "param": null, "body": {}}}, "finalizer": null}}"#,
            block(&[]),
            block(&[])
        );

        // switch (k) { case 1: break; default: go(); }
        let switch = format!(
            r#"{{"type": "SwitchStatement", "discriminant": {}, "cases": [
                {{"type": "SwitchCase", "test": {{"type": "Literal", "value": 1}}, "consequent": [{{"type": "BreakStatement", "label": null}}]}},
                {{"type": "SwitchCase", "test": null, "consequent": [{}]}}
            ]}}"#,
            ident("k"),
            expr_stmt(&call(&ident("go"), &[]))
        );

        // outer: for (;;) { continue outer; }
        let labeled = format!(
            r#"{{"type": "LabeledStatement", "label": {}, "body": {{"type": "ForStatement", "init": null, "test": null, "update": null, "body": {}}}}}"#,
            ident("outer"),
            block(&[format!(r#"{{"type": "ContinueStatement", "label": {}}}"#, ident("outer"))])
        );

        let json = program(&[try_stmt, bare_catch, switch, labeled].join(", "));
        let module = module_from_estree(&json, "control.js").unwrap();
        assert_eq!(
            print_module(&module),
            "try {} catch (e) {\n  report(e);\n} finally {\n  done();\n}\n\
             try {} catch {}\n\
             switch (k) {\n  case 1:\n    break;\n  default:\n    go();\n}\n\
             outer: for (;;) {\n  continue outer;\n}\n"
        );
    }

    #[test]
    fn test_lower_tagged_template_accessor_and_dynamic_import() {
        // const s = tag`a${x}b`;
        let quasi = format!(
            r#"{{"type": "TemplateLiteral", "quasis": [
                {{"type": "TemplateElement", "value": {{"raw": "a", "cooked": "a"}}, "tail": false}},
                {{"type": "TemplateElement", "value": {{"raw": "b", "cooked": "b"}}, "tail": true}}
            ], "expressions": [{}]}}"#,
            ident("x")
        );
        let tagged = format!(
            r#"{{"type": "TaggedTemplateExpression", "tag": {}, "quasi": {}}}"#,
            ident("tag"),
            quasi
        );
        let s = format!(
            r#"{{"type": "VariableDeclaration", "kind": "const", "declarations": [{{"type": "VariableDeclarator", "id": {}, "init": {}}}]}}"#,
            ident("s"),
            tagged
        );

        // const o = { get v() { return 1; } };
        let getter = format!(
            r#"{{"type": "Property", "key": {}, "kind": "get", "computed": false, "shorthand": false, "method": false,
                "value": {{"type": "FunctionExpression", "id": null, "params": [], "body": {}}}}}"#,
            ident("v"),
            block(&[r#"{"type": "ReturnStatement", "argument": {"type": "Literal", "value": 1}}"#.to_string()])
        );
        let o = format!(
            r#"{{"type": "VariableDeclaration", "kind": "const", "declarations": [{{"type": "VariableDeclarator", "id": {}, "init": {{"type": "ObjectExpression", "properties": [{}]}}}}]}}"#,
            ident("o"),
            getter
        );

        // import("./lazy");
        let lazy = expr_stmt(r#"{"type": "ImportExpression", "source": {"type": "Literal", "value": "./lazy"}}"#);

        let json = program(&[s, o, lazy].join(", "));
        let module = module_from_estree(&json, "misc.js").unwrap();
        assert_eq!(
            print_module(&module),
            "const s = tag`a${x}b`;\n\
             const o = { get v() {\n  return 1;\n} };\n\
             import(\"./lazy\");\n"
        );
    }

    #[test]
    fn test_unsupported_node_is_ast_error() {
        let json = r#"{"type": "Program", "body": [{"type": "WithStatement"}]}"#;
        let err = module_from_estree(json, "d.js").unwrap_err();
        assert!(matches!(err, ShakerError::Ast { .. }));
    }
}
