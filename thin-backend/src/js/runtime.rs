//! Factory scaffolding around the compiled functions: the memory buffer and
//! its views, the initial data, import bindings, the allocator and the
//! export object

use crate::memory::heap_start;
use std::fmt::{self, Write};
use thin_ir::Module;

/// Typed-array views over the buffer, in declaration order
const VIEWS: [(&str, &str); 5] = [
    ("m1", "Int8Array"),
    ("u1", "Uint8Array"),
    ("m2", "Int16Array"),
    ("u2", "Uint16Array"),
    ("m4", "Int32Array"),
];

/// JavaScript string literal
pub fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Buffer byte length: the data segment rounded up so the 32-bit view
/// covers it exactly
pub fn buffer_size(module: &Module, growable: bool) -> usize {
    let size = (module.data.len() + 3) & !3;
    if growable {
        size.max(8)
    } else {
        size
    }
}

pub fn write_prelude(out: &mut String, module: &Module, growable: bool) -> fmt::Result {
    writeln!(out, "(function(imports) {{")?;
    writeln!(out, "  var buffer = new ArrayBuffer({});", buffer_size(module, growable))?;
    for (name, constructor) in VIEWS {
        writeln!(out, "  var {name} = new {constructor}(buffer);")?;
    }
    writeln!(out, "  var exports = {{}};")?;

    let range = module.data_range();
    if !range.is_empty() {
        let bytes: Vec<String> = module.data[range.clone()].iter().map(u8::to_string).collect();
        writeln!(out, "  u1.set([{}], {});", bytes.join(", "), range.start)?;
    }

    for import in &module.imports {
        writeln!(
            out,
            "  var i{} = imports[{}][{}];",
            import.id,
            quote(&import.location),
            quote(&import.name)
        )?;
    }

    Ok(())
}

/// Bump allocator that doubles the buffer until the request fits, copies
/// the old contents over and rebuilds every view.
///
/// `free` and `end` are kept as unsigned 32-bit values so a request that
/// wraps the address space or passes `max_bytes` throws and leaves `free`
/// untouched.
pub fn write_allocator(out: &mut String, module: &Module, max_bytes: u32) -> fmt::Result {
    writeln!(out, "  var free = {};", heap_start(module.data.len()))?;
    writeln!(out, "  function alloc(size) {{")?;
    writeln!(out, "    size = size | 0;")?;
    writeln!(out, "    var start = free;")?;
    writeln!(out, "    var end = (start + size + 7 & -8) >>> 0;")?;
    writeln!(
        out,
        "    if (end < start || end > {max_bytes}) throw new Error(\"Out of memory\");"
    )?;
    writeln!(out, "    if (end > buffer.byteLength) {{")?;
    writeln!(out, "      var length = Math.max(buffer.byteLength, 8);")?;
    writeln!(out, "      while (length < end) length *= 2;")?;
    writeln!(out, "      if (length > {max_bytes}) throw new Error(\"Out of memory\");")?;
    writeln!(out, "      var next = new ArrayBuffer(length);")?;
    writeln!(out, "      new Uint8Array(next).set(u1);")?;
    writeln!(out, "      buffer = next;")?;
    for (name, constructor) in VIEWS {
        writeln!(out, "      {name} = new {constructor}(buffer);")?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "    free = end;")?;
    writeln!(out, "    return start | 0;")?;
    writeln!(out, "  }}")?;
    writeln!(out, "  exports[\"alloc\"] = alloc;")
}

pub fn write_epilogue(out: &mut String) -> fmt::Result {
    // Same shape as the binary module's memory export
    writeln!(out, "  exports[\"memory\"] = {{ get buffer() {{ return buffer; }} }};")?;
    writeln!(out, "  return exports;")?;
    writeln!(out, "}})")
}
