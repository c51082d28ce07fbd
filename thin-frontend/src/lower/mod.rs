//! Lowering from the syntax tree to IR
//!
//! Top-level `name = literal` items become global variables in the data
//! segment and top-level `def` items become exported functions taking and
//! returning `i32`. Lowering runs in three steps:
//!
//! 1. declare every global and function in source order, so bodies may call
//!    functions defined later;
//! 2. collect imports across all bodies ([`resolve::collect_imports`]);
//! 3. lower each body.

pub mod data;
pub mod errors;
pub mod resolve;
pub mod scope;

pub use errors::LoweringError;

use crate::parser::{BinaryOp, Expression, ExpressionKind, Program};
use data::DataSegment;
use log::debug;
use scope::{FunctionScope, GlobalScope, GlobalSymbol, ImportSymbol};
use thin_common::{CompilerError, SourceLocation};
use thin_ir::{Function, Import, Kind, Module, Node, Type};

/// Default size of the memory image in bytes
pub const DEFAULT_MEMORY_SIZE: usize = 128 * 1024;

/// Default namespace for imports inferred from unbound calls
pub const DEFAULT_IMPORT_LOCATION: &str = "lib";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweringOptions {
    /// Minimum length of the module's data segment
    pub memory_size: usize,
    pub import_location: String,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            import_location: DEFAULT_IMPORT_LOCATION.to_string(),
        }
    }
}

/// Named parameter of a `def` item
#[derive(Debug, Clone, Copy)]
pub struct Param<'p> {
    pub name: &'p str,
    pub location: &'p SourceLocation,
}

/// A `def` item after declaration
#[derive(Debug, Clone)]
pub struct FunctionDecl<'p> {
    pub name: &'p str,
    pub id: u32,
    pub params: Vec<Param<'p>>,
    pub body: &'p Expression,
    pub location: &'p SourceLocation,
}

/// Lower a parsed program into an IR module
pub fn lower_program(program: &Program, options: &LoweringOptions) -> Result<Module, CompilerError> {
    let mut lowerer = Lowerer::new();

    for item in &program.items {
        lowerer.declare(item)?;
    }

    let requests = resolve::collect_imports(&lowerer.functions, &lowerer.globals)?;
    let mut module = Module::new();
    for (id, request) in requests.into_iter().enumerate() {
        let id = id as u32;
        lowerer.globals.declare_import(&request.name, ImportSymbol { id, arity: request.arity });
        module.add_import(Import {
            location: options.import_location.clone(),
            name: request.name,
            id,
            arg_types: vec![Type::I32; request.arity],
            return_type: Type::I32,
        });
    }

    let decls = std::mem::take(&mut lowerer.functions);
    for decl in &decls {
        module.add_function(lowerer.lower_function(decl)?);
    }

    debug!(
        "Lowered {} functions, {} imports, {} bytes of data",
        module.functions.len(),
        module.imports.len(),
        lowerer.data.len()
    );

    module.data = lowerer.data.into_memory(options.memory_size);
    Ok(module)
}

/// Convert a literal to the 32-bit pattern it denotes
fn int_value(value: i64, location: &SourceLocation) -> Result<i32, LoweringError> {
    if (i32::MIN as i64..=u32::MAX as i64).contains(&value) {
        Ok(value as i32)
    } else {
        Err(LoweringError::IntegerOutOfRange {
            value,
            location: location.clone(),
        })
    }
}

fn expect_name<'p>(expr: &'p Expression, what: &'static str) -> Result<&'p str, LoweringError> {
    expr.as_identifier().ok_or_else(|| LoweringError::InvalidName {
        what,
        found: expr.describe(),
        location: expr.location.clone(),
    })
}

struct Lowerer<'p> {
    globals: GlobalScope,
    data: DataSegment,
    functions: Vec<FunctionDecl<'p>>,
}

impl<'p> Lowerer<'p> {
    fn new() -> Self {
        Self {
            globals: GlobalScope::new(),
            data: DataSegment::new(),
            functions: Vec::new(),
        }
    }

    fn declare(&mut self, item: &'p Expression) -> Result<(), LoweringError> {
        match &item.kind {
            ExpressionKind::Assign { target, value } => self.declare_variable(target, value),
            ExpressionKind::Def { name, params, body } => self.declare_function(item, name, params, body),
            _ => Err(LoweringError::InvalidGlobal {
                found: item.describe(),
                location: item.location.clone(),
            }),
        }
    }

    fn declare_variable(&mut self, target: &'p Expression, value: &'p Expression) -> Result<(), LoweringError> {
        let name = expect_name(target, "variable name")?;

        let ExpressionKind::IntLiteral(literal) = value.kind else {
            return Err(LoweringError::NonConstantGlobal {
                name: name.to_string(),
                location: value.location.clone(),
            });
        };
        let initial = int_value(literal, &value.location)?;

        if self.globals.lookup(name).is_some() {
            return Err(LoweringError::DuplicateGlobal {
                name: name.to_string(),
                location: target.location.clone(),
            });
        }

        let address = self.data.push_word(initial);
        self.globals.declare(name, GlobalSymbol::Variable { address });
        debug!("Global {name} at address {address}");
        Ok(())
    }

    fn declare_function(
        &mut self,
        item: &'p Expression,
        name: &'p Expression,
        params: &'p [Expression],
        body: &'p Expression,
    ) -> Result<(), LoweringError> {
        let function_name = expect_name(name, "function name")?;
        let params = params
            .iter()
            .map(|param| {
                Ok(Param {
                    name: expect_name(param, "function argument")?,
                    location: &param.location,
                })
            })
            .collect::<Result<Vec<_>, LoweringError>>()?;

        let id = self.functions.len() as u32;
        let symbol = GlobalSymbol::Function { id, arity: params.len() };
        if !self.globals.declare(function_name, symbol) {
            return Err(LoweringError::DuplicateGlobal {
                name: function_name.to_string(),
                location: name.location.clone(),
            });
        }

        self.functions.push(FunctionDecl {
            name: function_name,
            id,
            params,
            body,
            location: &item.location,
        });
        Ok(())
    }

    fn lower_function(&mut self, decl: &FunctionDecl<'p>) -> Result<Function, LoweringError> {
        let mut scope = FunctionScope::new();
        for param in &decl.params {
            if self.globals.lookup(param.name).is_some() {
                return Err(LoweringError::ArgumentShadowsGlobal {
                    name: param.name.to_string(),
                    location: param.location.clone(),
                });
            }
            if !scope.add_argument(param.name) {
                return Err(LoweringError::DuplicateArgument {
                    name: param.name.to_string(),
                    location: param.location.clone(),
                });
            }
        }

        let mut body = FunctionLowerer {
            globals: &self.globals,
            data: &mut self.data,
            scope: &mut scope,
        }
        .lower(decl.body)?;

        if body.kind != Kind::Block {
            body = Node::block(vec![body]);
        }

        let arg_count = scope.arg_count() as usize;
        let mut function = Function::new(decl.name.to_string(), decl.id, vec![Type::I32; arg_count], Type::I32);
        function.local_count = scope.local_count();
        function.is_exported = true;
        function.body = body;

        debug!(
            "Lowered function {} at {} ({} args, {} locals)",
            decl.name, decl.location, arg_count, function.local_count
        );
        Ok(function)
    }
}

/// Lowers one function body
struct FunctionLowerer<'a> {
    globals: &'a GlobalScope,
    data: &'a mut DataSegment,
    scope: &'a mut FunctionScope,
}

impl FunctionLowerer<'_> {
    fn lower(&mut self, expr: &Expression) -> Result<Node, LoweringError> {
        let location = &expr.location;

        let node = match &expr.kind {
            ExpressionKind::IntLiteral(value) => Node::i32_const(int_value(*value, location)?),

            ExpressionKind::StringLiteral(text) => Node::i32_const(self.data.intern_string(text) as i32),

            ExpressionKind::Identifier(name) => self.load_name(name, location)?,

            ExpressionKind::Binary { op, left, right } => {
                let left = self.lower(left)?;
                let right = self.lower(right)?;
                let kind = match op {
                    BinaryOp::LogicalAnd => return Ok(Node::select(left, right, Node::i32_const(0))),
                    BinaryOp::LogicalOr => return Ok(Node::select(left, Node::i32_const(1), right)),
                    BinaryOp::BitOr => Kind::I32Or,
                    BinaryOp::BitAnd => Kind::I32And,
                    BinaryOp::BitXor => Kind::I32Xor,
                    BinaryOp::Equal => Kind::I32Eq,
                    BinaryOp::NotEqual => Kind::I32Ne,
                    BinaryOp::Less => Kind::I32LtS,
                    BinaryOp::Greater => Kind::I32GtS,
                    BinaryOp::LessEqual => Kind::I32LeS,
                    BinaryOp::GreaterEqual => Kind::I32GeS,
                    BinaryOp::LeftShift => Kind::I32Shl,
                    BinaryOp::RightShift => Kind::I32ShrS,
                    BinaryOp::Add => Kind::I32Add,
                    BinaryOp::Sub => Kind::I32Sub,
                    BinaryOp::Mul => Kind::I32Mul,
                    BinaryOp::Div => Kind::I32DivS,
                    BinaryOp::Mod => Kind::I32RemS,
                };
                Node::binary(kind, left, right)
            }

            ExpressionKind::Assign { target, value } => match &target.kind {
                ExpressionKind::Index { .. } => {
                    let address = self.address(target)?;
                    Node::store(Kind::I32Store8, address, 0, self.lower(value)?)
                }
                ExpressionKind::Member { .. } => {
                    let address = self.address(target)?;
                    Node::store(Kind::I32Store, address, 0, self.lower(value)?)
                }
                ExpressionKind::Identifier(name) => self.store_name(name, value, &target.location)?,
                _ => {
                    return Err(LoweringError::InvalidAssignmentTarget {
                        found: target.describe(),
                        location: target.location.clone(),
                    });
                }
            },

            ExpressionKind::Index { .. } => Node::load(Kind::I32Load8U, self.address(expr)?, 0),
            ExpressionKind::Member { .. } => Node::load(Kind::I32Load, self.address(expr)?, 0),

            ExpressionKind::Conditional { test, then, otherwise } => {
                Node::select(self.lower(test)?, self.lower(then)?, self.lower(otherwise)?)
            }

            ExpressionKind::Call { function, arguments } => self.call(function, arguments, location)?,

            ExpressionKind::Def { .. } => {
                return Err(LoweringError::NestedFunction { location: location.clone() });
            }

            ExpressionKind::Block(items) => Node::block(self.lower_all(items)?),

            ExpressionKind::If { test, then, otherwise } => {
                let test = self.lower(test)?;
                let then = self.lower(then)?;
                let otherwise = match otherwise {
                    Some(otherwise) => self.lower(otherwise)?,
                    None => Node::nop(),
                };
                Node::if_else(test, then, otherwise)
            }

            ExpressionKind::While { test, body } => Node::while_loop(self.lower(test)?, self.lower(body)?),

            ExpressionKind::Return(value) => Node::ret(self.lower(value)?),
        };

        Ok(node)
    }

    /// Address computation for `a[i]` (bytes) and `a.i` (words)
    fn address(&mut self, expr: &Expression) -> Result<Node, LoweringError> {
        match &expr.kind {
            ExpressionKind::Index { base, index } => Ok(Node::add(self.lower(base)?, self.lower(index)?)),
            ExpressionKind::Member { base, index } => {
                let base = self.lower(base)?;
                let index = self.lower(index)?;
                Ok(Node::add(base, Node::shl(index, Node::i32_const(2))))
            }
            _ => self.lower(expr),
        }
    }

    fn load_name(&mut self, name: &str, location: &SourceLocation) -> Result<Node, LoweringError> {
        if let Some(slot) = self.scope.slot(name) {
            return Ok(Node::load_local(slot));
        }

        match self.globals.lookup(name) {
            Some(GlobalSymbol::Variable { address }) => {
                Ok(Node::load(Kind::I32Load, Node::i32_const(address as i32), 0))
            }
            Some(GlobalSymbol::Function { .. }) => Err(LoweringError::FunctionAsValue {
                name: name.to_string(),
                location: location.clone(),
            }),
            None => Ok(Node::load_local(self.scope.slot_or_allocate(name))),
        }
    }

    fn store_name(&mut self, name: &str, value: &Expression, location: &SourceLocation) -> Result<Node, LoweringError> {
        if let Some(slot) = self.scope.slot(name) {
            return Ok(Node::store_local(slot, self.lower(value)?));
        }

        match self.globals.lookup(name) {
            Some(GlobalSymbol::Variable { address }) => Ok(Node::store(
                Kind::I32Store,
                Node::i32_const(address as i32),
                0,
                self.lower(value)?,
            )),
            Some(GlobalSymbol::Function { .. }) => Err(LoweringError::FunctionAsValue {
                name: name.to_string(),
                location: location.clone(),
            }),
            None => {
                let slot = self.scope.slot_or_allocate(name);
                Ok(Node::store_local(slot, self.lower(value)?))
            }
        }
    }

    fn call(
        &mut self,
        function: &Expression,
        arguments: &[Expression],
        location: &SourceLocation,
    ) -> Result<Node, LoweringError> {
        let Some(name) = function.as_identifier() else {
            return Err(LoweringError::InvalidCallTarget {
                found: function.describe(),
                location: function.location.clone(),
            });
        };

        let check_arity = |expected: usize| {
            if expected == arguments.len() {
                Ok(())
            } else {
                Err(LoweringError::ArgumentCount {
                    name: name.to_string(),
                    expected,
                    found: arguments.len(),
                    location: location.clone(),
                })
            }
        };

        if let Some(GlobalSymbol::Function { id, arity }) = self.globals.lookup(name) {
            check_arity(arity)?;
            return Ok(Node::call(id, self.lower_all(arguments)?));
        }

        let import = self.globals.import(name).ok_or_else(|| LoweringError::CallToVariable {
            name: name.to_string(),
            location: location.clone(),
        })?;
        check_arity(import.arity)?;
        Ok(Node::call_import(import.id, self.lower_all(arguments)?))
    }

    fn lower_all(&mut self, exprs: &[Expression]) -> Result<Vec<Node>, LoweringError> {
        exprs.iter().map(|expr| self.lower(expr)).collect()
    }
}
