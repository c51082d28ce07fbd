//! Tests for the JavaScript text backend and the runner

use indoc::indoc;
use pretty_assertions::assert_eq;
use thin_backend::{build_runner, compile_js, compile_wasm, BinaryOptions, MemoryModel, TextOptions};
use thin_frontend::{Frontend, LoweringOptions};
use thin_ir::Module;

fn lower(source: &str) -> Module {
    Frontend::compile_to_ir(source, &LoweringOptions::default()).expect("Should lower")
}

#[test]
fn test_add_program() {
    let module = lower("x = 5; def add(a, b) { return a + b; } def main() { return add(x, 3); }");
    let text = compile_js(&module, &TextOptions::default()).unwrap();

    assert_eq!(
        text,
        indoc! {r#"
            (function(imports) {
              var buffer = new ArrayBuffer(131072);
              var m1 = new Int8Array(buffer);
              var u1 = new Uint8Array(buffer);
              var m2 = new Int16Array(buffer);
              var u2 = new Uint16Array(buffer);
              var m4 = new Int32Array(buffer);
              var exports = {};
              u1.set([5], 4);
              function f0(l0, l1) {
                l0 = l0 | 0;
                l1 = l1 | 0;
                return (l0 + l1 | 0);
              }
              exports["add"] = f0;
              function f1() {
                return f0(m4[4 >> 2], 3);
              }
              exports["main"] = f1;
              exports["memory"] = { get buffer() { return buffer; } };
              return exports;
            })
        "#}
    );
}

#[test]
fn test_imports_and_short_circuit() {
    let module = lower(r#"def main() { write("hi"); return ready() || check(1); }"#);
    let text = compile_js(&module, &TextOptions::default()).unwrap();

    assert!(text.contains("  u1.set([104, 105], 4);\n"));
    assert!(text.contains("  var i0 = imports[\"lib\"][\"write\"];\n"));
    assert!(text.contains("  var i1 = imports[\"lib\"][\"ready\"];\n"));
    assert!(text.contains("  var i2 = imports[\"lib\"][\"check\"];\n"));
    assert!(text.contains("    (i0(4) | 0);\n"));
    assert!(text.contains("    return ((i1() | 0) ? 1 : (i2(1) | 0));\n"));
}

#[test]
fn test_locals_loops_and_bytes() {
    let module = lower(indoc! {"
        def length(s) {
            n = 0;
            while (s[n]) n = n + 1;
            return n;
        }
    "});
    let text = compile_js(&module, &TextOptions::default()).unwrap();

    let expected: String = indoc! {"
        function f0(l0) {
          l0 = l0 | 0;
          var l1 = 0;
          l1 = 0;
          while (u1[(l0 + l1 | 0)]) {
            l1 = (l1 + 1 | 0);
          }
          return l1;
        }
    "}
    .lines()
    .map(|line| format!("  {line}\n"))
    .collect();
    assert!(text.contains(&expected), "{text}");
}

#[test]
fn test_growable_memory_exports_allocator() {
    let module = lower("def main() 0");
    let options = TextOptions {
        memory: MemoryModel::Growable { max_bytes: 1 << 20 },
    };
    let text = compile_js(&module, &options).unwrap();

    assert!(text.contains("  var free = 131072;\n"));
    assert!(text.contains("  function alloc(size) {\n"));
    assert!(text.contains("      if (length > 1048576) throw new Error(\"Out of memory\");\n"));
    assert!(text.contains("      new Uint8Array(next).set(u1);\n"));
    assert!(text.contains("  exports[\"alloc\"] = alloc;\n"));
    assert!(text.ends_with("  return exports;\n})\n"));
}

#[test]
fn test_unexported_function_and_negative_constants() {
    let mut module = lower("def f() 0 - 1 + 4294967295");
    module.functions[0].is_exported = false;
    let text = compile_js(&module, &TextOptions::default()).unwrap();

    assert!(text.contains("    ((0 - 1 | 0) + (-1) | 0);\n"));
    assert!(!text.contains("exports[\"f\"]"));
}

#[test]
fn test_runner_bundles_both_artifacts() {
    let module = lower(r#"def main() write("ok")"#);
    let js = compile_js(&module, &TextOptions::default()).unwrap();
    let wasm = compile_wasm(&module, &BinaryOptions::default()).unwrap();

    let script = build_runner(&js, &wasm);
    assert!(script.starts_with("var js = (function(imports) {\n"));
    assert!(script.contains("  return exports;\n});\nvar wasm"));
    assert!(script.contains("var wasm = new Uint8Array([\n  0, 97, 115, 109, 1, 0, 0, 0,"));
    assert!(script.contains("WebAssembly.instantiate(wasm, {lib: lib})"));
}
