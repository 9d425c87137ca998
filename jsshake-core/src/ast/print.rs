//! Deterministic JavaScript printer for the arena AST.
//!
//! Output is one statement per line with two-space indentation and
//! double-quoted strings. It exists for tests, `--print` and debugging; it is
//! not a code generator with source maps or comment preservation.

use super::{FnKind, Lit, Module, Node, NodeId, PropKind};

/// Renders the live tree of `module` as JavaScript source.
pub fn print_module(module: &Module) -> String {
    let mut printer = Printer {
        module,
        out: String::with_capacity(module.len() * 8),
        indent: 0,
    };
    for &stmt in module.body() {
        printer.stmt_line(stmt);
    }
    printer.out
}

// Binding power of expression kinds, loosest first.
const SEQ: u8 = 1;
const ASSIGN: u8 = 2;
const COND: u8 = 3;
const UNARY: u8 = 15;
const POSTFIX: u8 = 16;
const CALL: u8 = 18;
const PRIMARY: u8 = 20;

fn binary_precedence(op: &str) -> u8 {
    match op {
        "??" | "||" => 4,
        "&&" => 5,
        "|" => 6,
        "^" => 7,
        "&" => 8,
        "==" | "!=" | "===" | "!==" => 9,
        "<" | ">" | "<=" | ">=" | "instanceof" | "in" => 10,
        "<<" | ">>" | ">>>" => 11,
        "+" | "-" => 12,
        "*" | "/" | "%" => 13,
        "**" => 14,
        _ => 4,
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{}", n)
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

struct Printer<'m> {
    module: &'m Module,
    out: String,
    indent: usize,
}

impl<'m> Printer<'m> {
    fn node(&self, id: NodeId) -> &'m Node {
        self.module.node(id)
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn pad(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn stmt_line(&mut self, id: NodeId) {
        self.pad();
        self.stmt(id);
        self.out.push('\n');
    }

    fn comma_list(&mut self, items: &[NodeId], mut each: impl FnMut(&mut Self, NodeId)) {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            each(self, item);
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn stmt(&mut self, id: NodeId) {
        let module = self.module;
        match module.node(id) {
            Node::Import { source, specifiers } => self.import(source, specifiers),
            Node::ExportNamed {
                declaration,
                specifiers,
                source,
            } => {
                self.push("export ");
                if let Some(decl) = declaration {
                    self.stmt(*decl);
                    return;
                }
                if let [only] = specifiers.as_slice() {
                    if let Node::ExportNamespace { exported } = module.node(*only) {
                        self.push(&format!("* as {}", exported));
                        self.from_clause(source.as_deref());
                        return;
                    }
                }
                self.push("{ ");
                self.comma_list(specifiers, |p, s| match p.node(s) {
                    Node::ExportSpecifier { local, exported } => {
                        let local = module.ident_name(*local).unwrap_or_default();
                        if local == exported {
                            p.push(local);
                        } else {
                            p.push(&format!("{} as {}", local, exported));
                        }
                    }
                    Node::ExportNamespace { exported } => p.push(&format!("* as {}", exported)),
                    _ => {}
                });
                self.push(" }");
                self.from_clause(source.as_deref());
            }
            Node::ExportDefault { value } => {
                self.push("export default ");
                match module.node(*value) {
                    Node::Function {
                        kind: FnKind::Declaration,
                        ..
                    }
                    | Node::Class {
                        is_declaration: true,
                        ..
                    } => self.stmt(*value),
                    _ => {
                        self.expr(*value, ASSIGN);
                        self.push(";");
                    }
                }
            }
            Node::ExportAll { source } => {
                self.push("export *");
                self.from_clause(Some(source));
            }
            Node::VarDecl { kind, declarators } => {
                self.push(kind.as_str());
                self.push(" ");
                self.comma_list(declarators, |p, d| p.declarator(d));
                self.push(";");
            }
            Node::Function { .. } => self.function(id),
            Node::Class { .. } => self.class(id),
            Node::ExprStmt { expr } => {
                let start = self.out.len();
                self.expr(*expr, SEQ);
                let tail = &self.out[start..];
                let ambiguous = ["{", "function", "async function", "class", "let ["];
                if ambiguous.iter().any(|p| tail.starts_with(p)) {
                    self.out.insert(start, '(');
                    self.push(")");
                }
                self.push(";");
            }
            Node::Block { body } => self.block(body),
            Node::Return { arg } => {
                self.push("return");
                if let Some(arg) = arg {
                    self.push(" ");
                    self.expr(*arg, SEQ);
                }
                self.push(";");
            }
            Node::If { test, cons, alt } => {
                self.push("if (");
                self.expr(*test, SEQ);
                self.push(") ");
                self.stmt(*cons);
                if let Some(alt) = alt {
                    self.push(" else ");
                    self.stmt(*alt);
                }
            }
            Node::Throw { arg } => {
                self.push("throw ");
                self.expr(*arg, SEQ);
                self.push(";");
            }
            Node::For {
                init,
                test,
                update,
                body,
            } => {
                self.push("for (");
                if let Some(init) = init {
                    self.for_head(*init);
                }
                self.push(";");
                if let Some(test) = test {
                    self.push(" ");
                    self.expr(*test, SEQ);
                }
                self.push(";");
                if let Some(update) = update {
                    self.push(" ");
                    self.expr(*update, SEQ);
                }
                self.push(") ");
                self.stmt(*body);
            }
            Node::ForIn {
                left,
                right,
                body,
                of,
                is_await,
            } => {
                self.push(if *is_await { "for await (" } else { "for (" });
                self.for_head(*left);
                self.push(if *of { " of " } else { " in " });
                self.expr(*right, ASSIGN);
                self.push(") ");
                self.stmt(*body);
            }
            Node::While { test, body } => {
                self.push("while (");
                self.expr(*test, SEQ);
                self.push(") ");
                self.stmt(*body);
            }
            Node::DoWhile { body, test } => {
                self.push("do ");
                self.stmt(*body);
                self.push(" while (");
                self.expr(*test, SEQ);
                self.push(");");
            }
            Node::Try {
                block,
                handler,
                finalizer,
            } => {
                self.push("try ");
                self.stmt(*block);
                if let Some(Node::Catch { param, body }) = handler.map(|h| module.node(h)) {
                    self.push(" catch ");
                    if let Some(param) = param {
                        self.push("(");
                        self.expr(*param, ASSIGN);
                        self.push(") ");
                    }
                    self.stmt(*body);
                }
                if let Some(finalizer) = finalizer {
                    self.push(" finally ");
                    self.stmt(*finalizer);
                }
            }
            Node::Switch { discriminant, cases } => {
                self.push("switch (");
                self.expr(*discriminant, SEQ);
                self.push(") {\n");
                self.indent += 1;
                for &case in cases {
                    if let Node::SwitchCase { test, body } = module.node(case) {
                        self.pad();
                        match test {
                            Some(test) => {
                                self.push("case ");
                                self.expr(*test, SEQ);
                                self.push(":\n");
                            }
                            None => self.push("default:\n"),
                        }
                        self.indent += 1;
                        for &stmt in body {
                            self.stmt_line(stmt);
                        }
                        self.indent -= 1;
                    }
                }
                self.indent -= 1;
                self.pad();
                self.push("}");
            }
            Node::Labeled { label, body } => {
                self.push(label);
                self.push(": ");
                self.stmt(*body);
            }
            Node::Break { label } => self.jump("break", label.as_deref()),
            Node::Continue { label } => self.jump("continue", label.as_deref()),
            Node::Debugger => self.push("debugger;"),
            Node::Empty => self.push(";"),
            _ => {
                self.expr(id, SEQ);
                self.push(";");
            }
        }
    }

    fn jump(&mut self, keyword: &str, label: Option<&str>) {
        self.push(keyword);
        if let Some(label) = label {
            self.push(" ");
            self.push(label);
        }
        self.push(";");
    }

    /// Loop head: a declaration without its semicolon, or an expression.
    fn for_head(&mut self, id: NodeId) {
        match self.node(id) {
            Node::VarDecl { kind, declarators } => {
                self.push(kind.as_str());
                self.push(" ");
                self.comma_list(declarators, |p, d| p.declarator(d));
            }
            _ => self.expr(id, CALL),
        }
    }

    fn from_clause(&mut self, source: Option<&str>) {
        if let Some(source) = source {
            self.push(" from ");
            self.push(&quote(source));
        }
        self.push(";");
    }

    fn import(&mut self, source: &str, specifiers: &[NodeId]) {
        self.push("import ");
        let module = self.module;
        let mut parts = Vec::new();
        let mut named = Vec::new();
        for &spec in specifiers {
            match module.node(spec) {
                Node::ImportSpecifier { imported, local } => {
                    let local = module.ident_name(*local).unwrap_or_default();
                    if imported == "default" {
                        parts.push(local.to_string());
                    } else if imported == local {
                        named.push(local.to_string());
                    } else {
                        named.push(format!("{} as {}", imported, local));
                    }
                }
                Node::ImportNamespace { local } => {
                    let local = module.ident_name(*local).unwrap_or_default();
                    parts.push(format!("* as {}", local));
                }
                _ => {}
            }
        }
        if !named.is_empty() {
            parts.push(format!("{{ {} }}", named.join(", ")));
        }
        if !parts.is_empty() {
            self.push(&parts.join(", "));
            self.push(" from ");
        }
        self.push(&quote(source));
        self.push(";");
    }

    fn block(&mut self, body: &[NodeId]) {
        if body.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{\n");
        self.indent += 1;
        for &stmt in body {
            self.stmt_line(stmt);
        }
        self.indent -= 1;
        self.pad();
        self.push("}");
    }

    fn declarator(&mut self, id: NodeId) {
        if let Node::Declarator { id: target, init } = self.node(id) {
            let (target, init) = (*target, *init);
            self.expr(target, ASSIGN);
            if let Some(init) = init {
                self.push(" = ");
                self.expr(init, ASSIGN);
            }
        }
    }

    fn function(&mut self, id: NodeId) {
        let module = self.module;
        let Node::Function {
            kind,
            id: name,
            params,
            body,
            is_async,
            is_generator,
        } = module.node(id)
        else {
            return;
        };

        if *is_async {
            self.push("async ");
        }
        if *kind != FnKind::Arrow {
            self.push(if *is_generator { "function*" } else { "function" });
            if let Some(name) = name.and_then(|n| module.ident_name(n)) {
                self.push(" ");
                self.push(name);
            }
        }
        self.push("(");
        self.comma_list(params, |p, param| p.expr(param, ASSIGN));
        self.push(")");
        if *kind == FnKind::Arrow {
            self.push(" =>");
        }
        self.push(" ");
        self.function_body(*body);
    }

    fn function_body(&mut self, body: NodeId) {
        let module = self.module;
        match module.node(body) {
            Node::Block { body } => self.block(body),
            Node::Object { .. } => {
                self.push("(");
                self.expr(body, ASSIGN);
                self.push(")");
            }
            _ => self.expr(body, ASSIGN),
        }
    }

    /// `key(params) { body }` with its `static`/`get`/`set`/`async`/`*`
    /// prefixes already decided by the caller.
    fn method(&mut self, key: NodeId, computed: bool, kind: PropKind, value: NodeId) {
        let module = self.module;
        let Node::Function {
            params,
            body,
            is_async,
            is_generator,
            ..
        } = module.node(value)
        else {
            return;
        };
        match kind {
            PropKind::Get => self.push("get "),
            PropKind::Set => self.push("set "),
            PropKind::Init => {}
        }
        if *is_async {
            self.push("async ");
        }
        if *is_generator {
            self.push("*");
        }
        self.key(key, computed);
        self.push("(");
        self.comma_list(params, |p, param| p.expr(param, ASSIGN));
        self.push(") ");
        self.function_body(*body);
    }

    fn class(&mut self, id: NodeId) {
        let module = self.module;
        let Node::Class {
            id: name,
            super_class,
            members,
            ..
        } = module.node(id)
        else {
            return;
        };

        self.push("class");
        if let Some(name) = name.and_then(|n| module.ident_name(n)) {
            self.push(" ");
            self.push(name);
        }
        if let Some(sup) = super_class {
            self.push(" extends ");
            self.expr(*sup, CALL);
        }
        if members.is_empty() {
            self.push(" {}");
            return;
        }
        self.push(" {\n");
        self.indent += 1;
        for &member in members {
            self.pad();
            self.class_member(member);
            self.push("\n");
        }
        self.indent -= 1;
        self.pad();
        self.push("}");
    }

    fn class_member(&mut self, id: NodeId) {
        let module = self.module;
        let Node::ClassMember {
            key,
            value,
            computed,
            is_static,
            is_method,
            kind,
        } = module.node(id)
        else {
            return;
        };

        if *is_static {
            self.push("static ");
        }
        match (value, *is_method) {
            (Some(value), true) => self.method(*key, *computed, *kind, *value),
            (Some(value), false) => {
                self.key(*key, *computed);
                self.push(" = ");
                self.expr(*value, ASSIGN);
                self.push(";");
            }
            (None, _) => {
                self.key(*key, *computed);
                self.push(";");
            }
        }
    }

    fn key(&mut self, key: NodeId, computed: bool) {
        if computed {
            self.push("[");
            self.expr(key, ASSIGN);
            self.push("]");
        } else {
            self.expr(key, PRIMARY);
        }
    }

    // ------------------------------------------------------------------
    // Expressions and patterns
    // ------------------------------------------------------------------

    fn precedence(&self, id: NodeId) -> u8 {
        match self.node(id) {
            Node::Seq { .. } => SEQ,
            Node::Assign { .. } | Node::Yield { .. } => ASSIGN,
            Node::Function {
                kind: FnKind::Arrow, ..
            } => ASSIGN,
            Node::Cond { .. } => COND,
            Node::Binary { op, .. } => binary_precedence(op),
            Node::Unary { .. } | Node::Await { .. } => UNARY,
            Node::Update { prefix: true, .. } => UNARY,
            Node::Update { prefix: false, .. } => POSTFIX,
            Node::Call { is_new: true, .. } => CALL - 1,
            Node::Call { .. }
            | Node::Member { .. }
            | Node::Chain { .. }
            | Node::TaggedTemplate { .. }
            | Node::ImportCall { .. } => CALL,
            _ => PRIMARY,
        }
    }

    /// Object of a member access, callee or tag. A closed optional chain
    /// keeps its parentheses so the short-circuit does not extend.
    fn chain_operand(&mut self, id: NodeId) {
        if matches!(self.node(id), Node::Chain { .. }) {
            self.push("(");
            self.expr_inner(id);
            self.push(")");
        } else {
            self.expr(id, CALL);
        }
    }

    fn expr(&mut self, id: NodeId, min: u8) {
        let wrap = self.precedence(id) < min;
        if wrap {
            self.push("(");
        }
        self.expr_inner(id);
        if wrap {
            self.push(")");
        }
    }

    fn expr_inner(&mut self, id: NodeId) {
        let module = self.module;
        match module.node(id) {
            Node::Ident { name } => self.push(name),
            Node::Lit(lit) => match lit {
                Lit::Str(s) => self.push(&quote(s)),
                Lit::Num(n) => self.push(&format_number(*n)),
                Lit::Bool(b) => self.push(if *b { "true" } else { "false" }),
                Lit::Null => self.push("null"),
            },
            Node::This => self.push("this"),
            Node::Super => self.push("super"),
            Node::MetaProperty { meta, property } => self.push(&format!("{}.{}", meta, property)),
            Node::Member {
                object,
                property,
                computed,
                optional,
            } => {
                self.chain_operand(*object);
                match (*computed, *optional) {
                    (true, true) => self.push("?.["),
                    (true, false) => self.push("["),
                    (false, true) => self.push("?."),
                    (false, false) => self.push("."),
                }
                if *computed {
                    self.expr(*property, SEQ);
                    self.push("]");
                } else {
                    self.expr(*property, PRIMARY);
                }
            }
            Node::Call {
                callee,
                args,
                is_new,
                optional,
            } => {
                if *is_new {
                    self.push("new ");
                }
                self.chain_operand(*callee);
                self.push(if *optional { "?.(" } else { "(" });
                self.comma_list(args, |p, a| p.expr(a, ASSIGN));
                self.push(")");
            }
            Node::ImportCall { source } => {
                self.push("import(");
                self.expr(*source, ASSIGN);
                self.push(")");
            }
            Node::Chain { expr } => self.expr(*expr, CALL),
            Node::Await { arg } => {
                self.push("await ");
                self.expr(*arg, UNARY);
            }
            Node::Yield { arg, delegate } => {
                self.push(if *delegate { "yield*" } else { "yield" });
                if let Some(arg) = arg {
                    self.push(" ");
                    self.expr(*arg, ASSIGN);
                }
            }
            Node::Template { quasis, exprs } => {
                self.push("`");
                for (i, quasi) in quasis.iter().enumerate() {
                    self.push(quasi);
                    if let Some(&expr) = exprs.get(i) {
                        self.push("${");
                        self.expr(expr, SEQ);
                        self.push("}");
                    }
                }
                self.push("`");
            }
            Node::TaggedTemplate { tag, quasi } => {
                self.chain_operand(*tag);
                self.expr(*quasi, PRIMARY);
            }
            Node::Assign { op, target, value } => {
                self.expr(*target, CALL);
                self.push(&format!(" {} ", op));
                self.expr(*value, ASSIGN);
            }
            Node::Binary { op, left, right } => {
                let prec = binary_precedence(op);
                self.expr(*left, prec);
                self.push(&format!(" {} ", op));
                self.expr(*right, prec + 1);
            }
            Node::Unary { op, arg } => {
                self.push(op);
                if op.chars().all(|c| c.is_ascii_alphabetic()) {
                    self.push(" ");
                }
                self.expr(*arg, UNARY);
            }
            Node::Update { op, prefix, arg } => {
                if *prefix {
                    self.push(op);
                    self.expr(*arg, UNARY);
                } else {
                    self.expr(*arg, POSTFIX);
                    self.push(op);
                }
            }
            Node::Cond { test, cons, alt } => {
                self.expr(*test, COND + 1);
                self.push(" ? ");
                self.expr(*cons, ASSIGN);
                self.push(" : ");
                self.expr(*alt, ASSIGN);
            }
            Node::Seq { exprs } => self.comma_list(exprs, |p, e| p.expr(e, ASSIGN)),
            Node::Array { elems } | Node::ArrayPattern { elems } => {
                self.push("[");
                self.comma_list(elems, |p, e| p.expr(e, ASSIGN));
                self.push("]");
            }
            Node::Object { props } | Node::ObjectPattern { props } => {
                if props.is_empty() {
                    self.push("{}");
                } else {
                    self.push("{ ");
                    self.comma_list(props, |p, prop| p.expr(prop, ASSIGN));
                    self.push(" }");
                }
            }
            Node::Property {
                key,
                value,
                computed,
                kind: kind @ (PropKind::Get | PropKind::Set),
                ..
            } => self.method(*key, *computed, *kind, *value),
            Node::Property {
                key,
                value,
                computed,
                shorthand,
                ..
            } => {
                if *shorthand {
                    self.expr(*value, ASSIGN);
                } else {
                    self.key(*key, *computed);
                    self.push(": ");
                    self.expr(*value, ASSIGN);
                }
            }
            Node::Spread { arg } | Node::Rest { arg } => {
                self.push("...");
                self.expr(*arg, ASSIGN);
            }
            Node::AssignPattern { target, default } => {
                self.expr(*target, CALL);
                self.push(" = ");
                self.expr(*default, ASSIGN);
            }
            Node::Function { .. } => self.function(id),
            Node::Class { .. } => self.class(id),
            Node::Empty => {}
            // Statements never appear in expression position.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ModuleBuilder, VarKind};

    #[test]
    fn test_print_imports_and_exports() {
        let mut b = ModuleBuilder::new("a.js");
        let imp = b.import_named("./dep", &[("default", "dep"), ("a", "a"), ("b", "c")]);
        let ns = b.import_namespace("./ns", "ns");
        let bare = b.import_bare("./polyfill");
        let one = b.num(1.0);
        let decl = b.const_decl("x", one);
        let exp = b.export_decl(decl);
        let named = b.export_named(&[("x", "x"), ("x", "y")]);
        let all = b.export_all("./all");
        let all_as = b.export_all_as("./other", "other");
        for stmt in [imp, ns, bare, exp, named, all, all_as] {
            b.push(stmt);
        }
        let module = b.finish();

        assert_eq!(
            print_module(&module),
            "import dep, { a, b as c } from \"./dep\";\n\
             import * as ns from \"./ns\";\n\
             import \"./polyfill\";\n\
             export const x = 1;\n\
             export { x, x as y };\n\
             export * from \"./all\";\n\
             export * as other from \"./other\";\n"
        );
    }

    #[test]
    fn test_print_precedence() {
        let mut b = ModuleBuilder::new("a.js");
        let a = b.ident("a");
        let c = b.ident("c");
        let d = b.ident("d");
        let sum = b.binary("+", c, d);
        let product = b.binary("*", a, sum);
        let stmt = b.expr_stmt(product);
        b.push(stmt);
        let module = b.finish();

        assert_eq!(print_module(&module), "a * (c + d);\n");
    }

    #[test]
    fn test_print_function_and_object_statement() {
        let mut b = ModuleBuilder::new("a.js");
        let x = b.ident("x");
        let ret = b.ret(Some(x));
        let f = b.function_decl("id", &["x"], vec![ret]);
        let obj = b.object(vec![]);
        let stmt = b.expr_stmt(obj);
        let decl = b.uninit_decl(VarKind::Let, "y");
        b.push(f).push(stmt).push(decl);
        let module = b.finish();

        assert_eq!(
            print_module(&module),
            "function id(x) {\n  return x;\n}\n({});\nlet y;\n"
        );
    }

    #[test]
    fn test_print_numbers_and_strings() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }
}
