//! Node.js runner script
//!
//! Bundles the JavaScript factory and the WebAssembly bytes of one program
//! into a single script. The script reads all of stdin, wires `lib.read`
//! (next input byte, 0 at end of input) and `lib.write` (print the
//! NUL-terminated string at an address), then calls the exported `main`.
//! Passing `--wasm` to the script runs the binary module instead of the
//! JavaScript one.

const BYTES_PER_LINE: usize = 16;

const HOST: &str = r#"var input = '';
var position = 0;
var env;
var lib = {
  read: function() {
    return position < input.length ? input.charCodeAt(position++) : 0;
  },
  write: function(address) {
    process.stdout.write(pointerToString(address));
    return 0;
  },
};
function pointerToString(address) {
  var bytes = new Uint8Array(env.memory.buffer);
  var end = address;
  while (bytes[end]) end++;
  return Buffer.from(bytes.subarray(address, end)).toString();
}
var ready = process.argv.indexOf('--wasm') < 0
  ? Promise.resolve(js({lib: lib}))
  : WebAssembly.instantiate(wasm, {lib: lib}).then(function(result) {
      return result.instance.exports;
    });
process.stdin.on('data', function(chunk) { input += chunk; });
process.stdin.on('end', function() {
  ready.then(function(exports) {
    env = exports;
    if (typeof env.main !== 'function') throw new Error('No exported function "main"');
    env.main();
  }).catch(function(error) {
    console.error(error.message.trim());
    process.exit(1);
  });
});
"#;

/// Build the runner from the text factory and the binary module
pub fn build_runner(factory: &str, wasm: &[u8]) -> String {
    let mut out = String::new();
    out.push_str("var js = ");
    out.push_str(factory.trim_end());
    out.push_str(";\n");

    out.push_str("var wasm = new Uint8Array([\n");
    for line in wasm.chunks(BYTES_PER_LINE) {
        let bytes: Vec<String> = line.iter().map(u8::to_string).collect();
        out.push_str(&format!("  {},\n", bytes.join(", ")));
    }
    out.push_str("]);\n");

    out.push_str(HOST);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_layout() {
        let wasm: Vec<u8> = (0..20).collect();
        let script = build_runner("(function(imports) {\n  return {};\n})\n", &wasm);

        assert!(script.starts_with("var js = (function(imports) {\n  return {};\n});\nvar wasm = new Uint8Array([\n"));
        assert!(script.contains("  0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,\n  16, 17, 18, 19,\n]);\n"));
        assert!(script.contains("process.argv.indexOf('--wasm')"));
        assert!(script.contains("env.main();"));
    }
}
