//! Function bodies as JavaScript statements and expressions
//!
//! Every composite expression is wrapped in parentheses (or is a call or
//! an index), so operands can be spliced next to any operator without
//! precedence surprises.

use std::fmt::{self, Write};
use thin_ir::{Function, Kind, Node, Type};

/// Write `function f<id>(...) { ... }` for one function
pub fn emit_function(out: &mut String, function: &Function) -> fmt::Result {
    let arg_count = function.arg_types.len();
    let params: Vec<String> = (0..arg_count).map(|slot| format!("l{slot}")).collect();
    writeln!(out, "  function f{}({}) {{", function.id, params.join(", "))?;

    for param in &params {
        writeln!(out, "    {param} = {param} | 0;")?;
    }

    if function.local_count > 0 {
        let locals: Vec<String> = (arg_count..function.slot_count())
            .map(|slot| format!("l{slot} = 0"))
            .collect();
        writeln!(out, "    var {};", locals.join(", "))?;
    }

    let mut emitter = Emitter { out, depth: 2 };
    emitter.statement(&function.body)?;

    if function.return_type == Type::I32 && !ends_with_return(&function.body) {
        writeln!(emitter.out, "    return 0;")?;
    }

    writeln!(emitter.out, "  }}")
}

fn ends_with_return(body: &Node) -> bool {
    match body.kind {
        Kind::Return => true,
        Kind::Block => body.children.last().is_some_and(ends_with_return),
        _ => false,
    }
}

struct Emitter<'a> {
    out: &'a mut String,
    depth: usize,
}

impl Emitter<'_> {
    fn indent(&mut self) -> fmt::Result {
        write!(self.out, "{:width$}", "", width = self.depth * 2)
    }

    fn nested(&mut self, node: &Node) -> fmt::Result {
        self.depth += 1;
        let result = self.statement(node);
        self.depth -= 1;
        result
    }

    fn statement(&mut self, node: &Node) -> fmt::Result {
        let children = &node.children;

        match node.kind {
            Kind::Nop => Ok(()),
            Kind::Block => children.iter().try_for_each(|child| self.statement(child)),
            Kind::If => {
                self.indent()?;
                write!(self.out, "if (")?;
                self.expression(&children[0])?;
                writeln!(self.out, ") {{")?;
                self.nested(&children[1])?;
                if children[2].kind != Kind::Nop {
                    self.indent()?;
                    writeln!(self.out, "}} else {{")?;
                    self.nested(&children[2])?;
                }
                self.indent()?;
                writeln!(self.out, "}}")
            }
            Kind::While => {
                self.indent()?;
                write!(self.out, "while (")?;
                self.expression(&children[0])?;
                writeln!(self.out, ") {{")?;
                self.nested(&children[1])?;
                self.indent()?;
                writeln!(self.out, "}}")
            }
            Kind::Return => {
                let value = &children[0];
                if value.result_type() == Type::Void {
                    self.statement(value)?;
                    self.indent()?;
                    writeln!(self.out, "return;")
                } else {
                    self.indent()?;
                    write!(self.out, "return ")?;
                    self.expression(value)?;
                    writeln!(self.out, ";")
                }
            }
            Kind::VoidCall => {
                self.indent()?;
                self.call("f", node)?;
                writeln!(self.out, ";")
            }
            Kind::VoidCallImport => {
                self.indent()?;
                self.call("i", node)?;
                writeln!(self.out, ";")
            }
            Kind::I32StoreLocal => {
                self.indent()?;
                write!(self.out, "l{} = ", node.value)?;
                self.expression(&children[0])?;
                writeln!(self.out, ";")
            }
            Kind::I32Store | Kind::I32Store8 | Kind::I32Store16 => {
                self.indent()?;
                self.assignment(node)?;
                writeln!(self.out, ";")
            }
            _ => {
                self.indent()?;
                self.expression(node)?;
                writeln!(self.out, ";")
            }
        }
    }

    /// i32-valued expression. Void kinds have no value form and fail.
    fn expression(&mut self, node: &Node) -> fmt::Result {
        let children = &node.children;

        match node.kind {
            Kind::VoidCall | Kind::VoidCallImport | Kind::Nop => Err(fmt::Error),
            Kind::Block | Kind::If | Kind::While | Kind::Return => Err(fmt::Error),

            Kind::I32Const => {
                let value = node.value as i32;
                if value < 0 {
                    write!(self.out, "({value})")
                } else {
                    write!(self.out, "{value}")
                }
            }
            Kind::I32LoadLocal => write!(self.out, "l{}", node.value),
            Kind::I32StoreLocal => {
                write!(self.out, "(l{} = ", node.value)?;
                self.expression(&children[0])?;
                write!(self.out, ")")
            }

            Kind::I32Load | Kind::I32Load8S | Kind::I32Load8U | Kind::I32Load16S | Kind::I32Load16U => {
                self.element(node)
            }
            Kind::I32Store | Kind::I32Store8 | Kind::I32Store16 => {
                write!(self.out, "(")?;
                self.assignment(node)?;
                write!(self.out, ")")
            }

            Kind::I32Add => self.infix(node, "+", true),
            Kind::I32Sub => self.infix(node, "-", true),
            Kind::I32Mul => {
                write!(self.out, "Math.imul(")?;
                self.expression(&children[0])?;
                write!(self.out, ", ")?;
                self.expression(&children[1])?;
                write!(self.out, ")")
            }
            Kind::I32DivS => self.infix(node, "/", true),
            Kind::I32DivU => self.unsigned_arithmetic(node, "/"),
            Kind::I32RemS => self.infix(node, "%", true),
            Kind::I32RemU => self.unsigned_arithmetic(node, "%"),
            Kind::I32And => self.infix(node, "&", false),
            Kind::I32Or => self.infix(node, "|", false),
            Kind::I32Xor => self.infix(node, "^", false),
            Kind::I32Shl => self.infix(node, "<<", false),
            Kind::I32ShrS => self.infix(node, ">>", false),
            Kind::I32ShrU => self.infix(node, ">>>", true),

            Kind::I32Eq => self.infix(node, "==", true),
            Kind::I32Ne => self.infix(node, "!=", true),
            Kind::I32LtS => self.infix(node, "<", true),
            Kind::I32LeS => self.infix(node, "<=", true),
            Kind::I32GtS => self.infix(node, ">", true),
            Kind::I32GeS => self.infix(node, ">=", true),
            Kind::I32LtU => self.unsigned_comparison(node, "<"),
            Kind::I32LeU => self.unsigned_comparison(node, "<="),
            Kind::I32GtU => self.unsigned_comparison(node, ">"),
            Kind::I32GeU => self.unsigned_comparison(node, ">="),

            Kind::I32Call => self.call("f", node),
            Kind::I32CallImport => {
                // Host results are coerced to i32
                write!(self.out, "(")?;
                self.call("i", node)?;
                write!(self.out, " | 0)")
            }
            Kind::I32Select => {
                write!(self.out, "(")?;
                self.expression(&children[0])?;
                write!(self.out, " ? ")?;
                self.expression(&children[1])?;
                write!(self.out, " : ")?;
                self.expression(&children[2])?;
                write!(self.out, ")")
            }
        }
    }

    /// `(a op b)`, or `(a op b | 0)` when the result must be truncated
    fn infix(&mut self, node: &Node, operator: &str, truncate: bool) -> fmt::Result {
        write!(self.out, "(")?;
        self.expression(&node.children[0])?;
        write!(self.out, " {operator} ")?;
        self.expression(&node.children[1])?;
        if truncate {
            write!(self.out, " | 0")?;
        }
        write!(self.out, ")")
    }

    fn unsigned_arithmetic(&mut self, node: &Node, operator: &str) -> fmt::Result {
        write!(self.out, "((")?;
        self.expression(&node.children[0])?;
        write!(self.out, " >>> 0) {operator} (")?;
        self.expression(&node.children[1])?;
        write!(self.out, " >>> 0) | 0)")
    }

    fn unsigned_comparison(&mut self, node: &Node, operator: &str) -> fmt::Result {
        write!(self.out, "(")?;
        self.expression(&node.children[0])?;
        write!(self.out, " >>> 0 {operator} ")?;
        self.expression(&node.children[1])?;
        write!(self.out, " >>> 0 | 0)")
    }

    fn call(&mut self, prefix: &str, node: &Node) -> fmt::Result {
        write!(self.out, "{prefix}{}(", node.value)?;
        for (i, argument) in node.children.iter().enumerate() {
            if i > 0 {
                write!(self.out, ", ")?;
            }
            self.expression(argument)?;
        }
        write!(self.out, ")")
    }

    /// `view[address + offset >> shift]` for a load or the target of a store
    fn element(&mut self, node: &Node) -> fmt::Result {
        let (view, shift) = match node.kind {
            Kind::I32Load | Kind::I32Store => ("m4", 2),
            Kind::I32Load16S | Kind::I32Store16 => ("m2", 1),
            Kind::I32Load16U => ("u2", 1),
            Kind::I32Load8S | Kind::I32Store8 => ("m1", 0),
            _ => ("u1", 0),
        };

        write!(self.out, "{view}[")?;
        self.expression(&node.children[0])?;
        if node.value != 0 {
            write!(self.out, " + {}", node.value)?;
        }
        if shift > 0 {
            write!(self.out, " >> {shift}")?;
        }
        write!(self.out, "]")
    }

    fn assignment(&mut self, node: &Node) -> fmt::Result {
        self.element(node)?;
        write!(self.out, " = ")?;
        self.expression(&node.children[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    /// Emitted text with the factory-level indentation removed
    fn emit(function: &Function) -> String {
        let mut out = String::new();
        emit_function(&mut out, function).unwrap();
        out.lines()
            .map(|line| format!("{}\n", line.strip_prefix("  ").unwrap_or(line)))
            .collect()
    }

    fn function(arg_count: usize, local_count: u32, body: Node) -> Function {
        let mut function = Function::new("f".to_string(), 3, vec![Type::I32; arg_count], Type::I32);
        function.local_count = local_count;
        function.body = body;
        function
    }

    #[test]
    fn test_parameters_and_locals() {
        let f = function(
            2,
            2,
            Node::block(vec![Node::ret(Node::add(Node::load_local(0), Node::load_local(3)))]),
        );
        assert_eq!(
            emit(&f),
            indoc! {"
                  function f3(l0, l1) {
                    l0 = l0 | 0;
                    l1 = l1 | 0;
                    var l2 = 0, l3 = 0;
                    return (l0 + l3 | 0);
                  }
            "}
        );
    }

    #[test]
    fn test_control_flow() {
        let f = function(
            1,
            0,
            Node::block(vec![
                Node::while_loop(
                    Node::load_local(0),
                    Node::store_local(0, Node::binary(Kind::I32Sub, Node::load_local(0), Node::i32_const(1))),
                ),
                Node::if_else(
                    Node::binary(Kind::I32LtU, Node::load_local(0), Node::i32_const(-1)),
                    Node::void_call_import(0, vec![Node::i32_const(1)]),
                    Node::block(vec![Node::call(1, Vec::new())]),
                ),
            ]),
        );
        assert_eq!(
            emit(&f),
            indoc! {"
                  function f3(l0) {
                    l0 = l0 | 0;
                    while (l0) {
                      l0 = (l0 - 1 | 0);
                    }
                    if ((l0 >>> 0 < (-1) >>> 0 | 0)) {
                      i0(1);
                    } else {
                      f1();
                    }
                    return 0;
                  }
            "}
        );
    }

    #[test]
    fn test_memory_access() {
        let f = function(
            1,
            0,
            Node::block(vec![
                Node::store(
                    Kind::I32Store,
                    Node::load_local(0),
                    4,
                    Node::load(Kind::I32Load16U, Node::load_local(0), 0),
                ),
                Node::ret(Node::store(
                    Kind::I32Store8,
                    Node::load_local(0),
                    0,
                    Node::load(Kind::I32Load8S, Node::i32_const(9), 1),
                )),
            ]),
        );
        assert_eq!(
            emit(&f),
            indoc! {"
                  function f3(l0) {
                    l0 = l0 | 0;
                    m4[l0 + 4 >> 2] = u2[l0 >> 1];
                    return (m1[l0] = m1[9 + 1]);
                  }
            "}
        );
    }

    #[test]
    fn test_operator_forms() {
        let a = || Node::load_local(0);
        let b = || Node::load_local(1);
        let cases = [
            (Kind::I32Mul, "Math.imul(l0, l1)"),
            (Kind::I32DivS, "(l0 / l1 | 0)"),
            (Kind::I32DivU, "((l0 >>> 0) / (l1 >>> 0) | 0)"),
            (Kind::I32RemU, "((l0 >>> 0) % (l1 >>> 0) | 0)"),
            (Kind::I32ShrU, "(l0 >>> l1 | 0)"),
            (Kind::I32Xor, "(l0 ^ l1)"),
            (Kind::I32GeS, "(l0 >= l1 | 0)"),
        ];

        for (kind, expected) in cases {
            let f = function(2, 0, Node::ret(Node::binary(kind, a(), b())));
            assert!(emit(&f).contains(&format!("return {expected};")), "{kind}");
        }

        let f = function(
            2,
            0,
            Node::ret(Node::select(a(), Node::call_import(2, vec![b()]), Node::store_local(1, a()))),
        );
        assert!(emit(&f).contains("return (l0 ? (i2(l1) | 0) : (l1 = l0));"));
    }

    #[test]
    fn test_void_function() {
        let mut f = function(0, 0, Node::block(vec![Node::ret(Node::void_call(0, Vec::new()))]));
        f.return_type = Type::Void;
        assert_eq!(
            emit(&f),
            indoc! {"
                  function f3() {
                    f0();
                    return;
                  }
            "}
        );
    }

    #[test]
    fn test_void_node_has_no_value() {
        let f = function(0, 0, Node::ret(Node::add(Node::nop(), Node::i32_const(1))));
        let mut out = String::new();
        assert!(emit_function(&mut out, &f).is_err());
    }
}
