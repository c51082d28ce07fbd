//! IR listing
//!
//! Renders nodes, functions and modules as an indented s-expression listing:
//!
//! ```text
//! (func add id=0 (param i32 i32) (result i32) (local 1) export
//!   (block
//!     (return
//!       (i32.add
//!         (local.get 0)
//!         (local.get 1)))))
//! ```

use crate::kind::Kind;
use crate::module::{Function, Import, Module};
use crate::node::Node;
use std::fmt::{self, Write};

const INDENT: &str = "  ";

fn write_node(f: &mut impl Write, node: &Node, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    write!(f, "({}", node.kind)?;

    match node.kind {
        Kind::I32Const | Kind::I32LoadLocal | Kind::I32StoreLocal => write!(f, " {}", node.value)?,
        Kind::VoidCall | Kind::I32Call => write!(f, " $f{}", node.value)?,
        Kind::VoidCallImport | Kind::I32CallImport => write!(f, " $i{}", node.value)?,
        k if k.has_offset() && node.value != 0 => write!(f, " offset={}", node.value)?,
        _ => {}
    }

    for child in &node.children {
        f.write_char('\n')?;
        write_node(f, child, depth + 1)?;
    }
    f.write_char(')')
}

fn write_types(f: &mut fmt::Formatter<'_>, label: &str, types: &[crate::Type]) -> fmt::Result {
    if types.is_empty() {
        return Ok(());
    }
    write!(f, " ({label}")?;
    for ty in types {
        write!(f, " {ty}")?;
    }
    f.write_char(')')
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(import \"{}\" \"{}\" id={}", self.location, self.name, self.id)?;
        write_types(f, "param", &self.arg_types)?;
        write!(f, " (result {}))", self.return_type)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(func {} id={}", self.name, self.id)?;
        write_types(f, "param", &self.arg_types)?;
        write!(f, " (result {})", self.return_type)?;
        if self.local_count > 0 {
            write!(f, " (local {})", self.local_count)?;
        }
        if self.is_exported {
            f.write_str(" export")?;
        }
        f.write_char('\n')?;
        write_node(f, &self.body, 1)?;
        f.write_char(')')
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = self.data_range();
        writeln!(f, "(module")?;
        writeln!(f, "{INDENT}(data size={} used={}..{})", self.data.len(), range.start, range.end)?;
        for import in &self.imports {
            writeln!(f, "{INDENT}{import}")?;
        }
        for function in &self.functions {
            let text = function.to_string();
            for line in text.lines() {
                writeln!(f, "{INDENT}{line}")?;
            }
        }
        f.write_char(')')
    }
}
