//! Statement-level driver.
//!
//! A recursive-descent parser over the token stream that sequences declarations and control flow and hands
//! every expression to the [`ExpressionAnalyzer`]. It owns the whole compilation context: the lexer, the
//! symbol table, the emitter and the options. Nothing is process-global, so independent compilations can
//! run side by side.
//!
//! ## Module Structure
//!
//! - `statements` - statements inside a body (`Dim`, assignment, `If`, loops, I/O, `Return`)
//!
//! ## Notes
//! - `program := { fundecl EOL | fundef EOL } Scope EOL body End Scope { EOL } EOF`
//! - Every frame pop emits the `POPS` that restore the variables redefined in that frame.

mod statements;

use std::io::BufRead;

use bascule_core::lang::keywords::{self, KeywordId};
use bascule_core::lang::operators::{self, OperatorId};
use bascule_core::lang::punctuation::{self, PunctuationId};
use bascule_core::lang::types::DataType;

use crate::analyzer::{ExpressionAnalyzer, ExpressionMode, TokenSource};
use crate::backend::ir::prelude::register_builtins;
use crate::backend::ir::{Constant, Emitter, Instruction, MAIN_LABEL, Opcode, Operand, Program};
use crate::config::CompilerOptions;
use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::lexer::{Lexer, Token, TokenKind};
use crate::frontend::symbols::{ArgumentList, FunctionMeta, Symbol, SymbolKind, SymbolTable};

/// Compile a whole program read from `reader`.
///
/// ## Errors
/// The first error hit; its position carries the text of the offending line when the lexer still holds it.
#[tracing::instrument(skip_all, fields(folding = ?options.constant_folding))]
pub fn compile<R: BufRead>(reader: R, options: &CompilerOptions) -> CompileResult<Program> {
    let mut compiler = Compiler::new(reader, options.clone());
    match compiler.program() {
        Ok(()) => Ok(compiler.emitter.finish()),
        Err(err) => {
            let line = compiler.tokens.lexer.line();
            let text = compiler.tokens.lexer.current_line_text();
            Err(err.with_source_line(line, &text))
        }
    }
}

// ============================================================================
// Token stream
// ============================================================================

/// One-token lookahead over the lexer.
pub struct TokenStream<R> {
    lexer: Lexer<R>,
    peeked: Option<Token>,
}

impl<R: BufRead> TokenStream<R> {
    pub fn new(lexer: Lexer<R>) -> Self {
        Self { lexer, peeked: None }
    }
}

impl<R: BufRead> TokenSource for TokenStream<R> {
    fn peek(&mut self, symbols: &mut SymbolTable) -> CompileResult<&Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token(symbols)?);
        }
        self.peeked
            .as_ref()
            .ok_or_else(|| CompileError::internal("lookahead token missing after read"))
    }

    fn advance(&mut self, symbols: &mut SymbolTable) -> CompileResult<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(symbols),
        }
    }
}

// ============================================================================
// Compiler context
// ============================================================================

/// The function whose body is being compiled.
#[derive(Debug, Clone)]
struct FunctionContext {
    name: String,
    return_type: DataType,
}

pub struct Compiler<R> {
    tokens: TokenStream<R>,
    symbols: SymbolTable,
    emitter: Emitter,
    options: CompilerOptions,
    function: Option<FunctionContext>,
    next_if: usize,
    next_loop: usize,
}

impl<R: BufRead> Compiler<R> {
    pub fn new(reader: R, options: CompilerOptions) -> Self {
        let lexer = Lexer::with_line_chunk(reader, options.line_chunk);
        Self {
            tokens: TokenStream::new(lexer),
            symbols: SymbolTable::default(),
            emitter: Emitter::new(),
            options,
            function: None,
            next_if: 0,
            next_loop: 0,
        }
    }

    fn program(&mut self) -> CompileResult<()> {
        register_builtins(&mut self.symbols);
        loop {
            let token = self.peek()?.clone();
            match token.kind {
                TokenKind::Keyword(KeywordId::Declare) => self.function_declaration()?,
                TokenKind::Keyword(KeywordId::Function) => self.function_definition()?,
                TokenKind::Keyword(KeywordId::Scope) => break,
                TokenKind::Eol => {
                    self.advance()?;
                    continue;
                }
                _ => {
                    return Err(CompileError::syntax(format!(
                        "expected 'Declare', 'Function' or 'Scope', found {}",
                        token.describe()
                    ))
                    .with_token(&token));
                }
            }
            self.expect_eol()?;
        }

        self.main_scope()?;
        self.skip_eols()?;
        let token = self.advance()?;
        if token.kind != TokenKind::Eof {
            return Err(CompileError::syntax(format!(
                "unexpected {} after the main scope",
                token.describe()
            ))
            .with_token(&token));
        }
        self.check_all_defined()
    }

    fn main_scope(&mut self) -> CompileResult<()> {
        self.expect_keyword(KeywordId::Scope)?;
        self.expect_eol()?;
        self.symbols.push_frame(MAIN_LABEL, false, None);
        self.emitter.begin_section(MAIN_LABEL, Vec::<String>::new());
        self.body()?;
        self.expect_end(KeywordId::Scope)?;
        self.close_frame();
        self.emitter.end_section();
        Ok(())
    }

    fn check_all_defined(&self) -> CompileResult<()> {
        let undefined = self
            .symbols
            .global_symbols()
            .into_iter()
            .find(|s| s.function_meta().is_some_and(|meta| !meta.is_defined));
        match undefined {
            Some(symbol) => Err(CompileError::semantic(format!(
                "function '{}' is declared but never defined",
                symbol.identifier
            ))),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// `Declare Function id ( params ) As type`
    fn function_declaration(&mut self) -> CompileResult<()> {
        self.expect_keyword(KeywordId::Declare)?;
        self.expect_keyword(KeywordId::Function)?;
        let (name, arguments, return_type) = self.function_header()?;
        if self.symbols.find_symbol(&name.text).is_some() {
            return Err(CompileError::semantic(format!("'{}' is already declared", name.text)).with_token(&name));
        }
        let meta = FunctionMeta {
            label: name.text.clone(),
            return_type,
            is_defined: false,
            arguments,
        };
        self.symbols
            .insert_global(Symbol::function(name.text.clone(), meta))
            .ok_or_else(|| CompileError::semantic(format!("'{}' is already declared", name.text)).with_token(&name))?;
        tracing::debug!(function = %name.text, "declared function");
        Ok(())
    }

    /// `Function id ( params ) As type EOL body End Function`
    fn function_definition(&mut self) -> CompileResult<()> {
        self.expect_keyword(KeywordId::Function)?;
        let (name, arguments, return_type) = self.function_header()?;
        let declared = self.bind_definition(&name, &arguments, return_type)?;
        self.expect_eol()?;

        self.symbols.push_frame(name.text.clone(), false, None);
        let declared_names: Vec<String> = declared.iter().map(|a| a.identifier.clone()).collect();
        self.emitter.begin_section(name.text.clone(), declared_names.clone());
        for argument in arguments.iter() {
            self.symbols
                .insert_on_top(Symbol::variable(argument.identifier.clone(), argument.data_type))
                .ok_or_else(|| CompileError::internal("duplicate parameter survived header checks"))?;
            self.emitter.declare_local(&argument.identifier);
        }
        let renamed = arguments
            .iter()
            .zip(declared.iter())
            .any(|(defined, declared)| defined.identifier != declared.identifier);
        if renamed {
            // Go through the data stack so swapped names cannot clobber each other.
            for declared_name in &declared_names {
                self.emit(Opcode::PushS, [Operand::var(declared_name.clone())]);
            }
            let defined_names: Vec<String> = arguments.iter().map(|a| a.identifier.clone()).collect();
            for defined_name in defined_names.into_iter().rev() {
                self.emit(Opcode::PopS, [Operand::var(defined_name)]);
            }
        }

        tracing::debug!(function = %name.text, "compiling function body");
        self.function = Some(FunctionContext {
            name: name.text.clone(),
            return_type,
        });
        let result = self.body().and_then(|()| self.expect_end(KeywordId::Function));
        self.function = None;
        result?;

        let zero = Constant::zero(return_type)
            .ok_or_else(|| CompileError::internal("function without a return type").with_token(&name))?;
        self.emit(Opcode::PushS, [Operand::Const(zero)]);
        self.emitter.emit(Instruction::bare(Opcode::Return));
        self.symbols.pop_frame();
        self.emitter.end_section();
        Ok(())
    }

    /// Check a definition against an earlier declaration and mark the function defined.
    ///
    /// ## Returns
    /// The declared parameter list, which is what callers bind.
    fn bind_definition(
        &mut self,
        name: &Token,
        arguments: &ArgumentList,
        return_type: DataType,
    ) -> CompileResult<ArgumentList> {
        let existing = self.symbols.find_symbol(&name.text);
        let Some(id) = existing else {
            let meta = FunctionMeta {
                label: name.text.clone(),
                return_type,
                is_defined: true,
                arguments: arguments.clone(),
            };
            self.symbols
                .insert_global(Symbol::function(name.text.clone(), meta))
                .ok_or_else(|| CompileError::internal("global insert failed after lookup miss"))?;
            return Ok(arguments.clone());
        };

        let meta = self
            .symbols
            .get_mut(id)
            .and_then(Symbol::function_meta_mut)
            .ok_or_else(|| CompileError::semantic(format!("'{}' is not a function", name.text)).with_token(name))?;
        if meta.is_defined {
            return Err(CompileError::semantic(format!("function '{}' is already defined", name.text)).with_token(name));
        }
        if meta.arguments != *arguments || meta.return_type != return_type {
            return Err(CompileError::semantic(format!(
                "definition of '{}' does not match its declaration",
                name.text
            ))
            .with_token(name));
        }
        meta.is_defined = true;
        Ok(meta.arguments.clone())
    }

    /// `id ( [id As type {, id As type}] ) As type`
    fn function_header(&mut self) -> CompileResult<(Token, ArgumentList, DataType)> {
        let name = self.expect_identifier()?;
        self.expect_punctuation(PunctuationId::LParen)?;
        let mut arguments = ArgumentList::new();
        if !self.peek()?.is_punctuation(PunctuationId::RParen) {
            loop {
                let parameter = self.expect_identifier()?;
                self.expect_keyword(KeywordId::As)?;
                let data_type = self.expect_type()?;
                self.check_parameter_name(&name, &arguments, &parameter)?;
                arguments.push(parameter.text.clone(), data_type);
                if !self.peek()?.is_punctuation(PunctuationId::Comma) {
                    break;
                }
                self.advance()?;
            }
        }
        self.expect_punctuation(PunctuationId::RParen)?;
        self.expect_keyword(KeywordId::As)?;
        let return_type = self.expect_type()?;
        Ok((name, arguments, return_type))
    }

    fn check_parameter_name(&self, function: &Token, arguments: &ArgumentList, parameter: &Token) -> CompileResult<()> {
        if arguments.contains(&parameter.text) {
            return Err(CompileError::semantic(format!("duplicate parameter '{}'", parameter.text)).with_token(parameter));
        }
        let is_function = parameter.text == function.text
            || self
                .symbols
                .find_symbol(&parameter.text)
                .and_then(|id| self.symbols.get(id))
                .is_some_and(|s| s.kind == SymbolKind::Function);
        if is_function {
            return Err(CompileError::semantic(format!(
                "parameter '{}' collides with a function name",
                parameter.text
            ))
            .with_token(parameter));
        }
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn analyzer(&mut self) -> ExpressionAnalyzer<'_> {
        ExpressionAnalyzer::new(&mut self.symbols, &mut self.emitter, &self.options)
    }

    /// Parse one expression; the token that ends it is left in the stream.
    fn expression(&mut self) -> CompileResult<Token> {
        let mut analyzer = ExpressionAnalyzer::new(&mut self.symbols, &mut self.emitter, &self.options);
        analyzer.analyze(&mut self.tokens, ExpressionMode::Expression)
    }

    fn assignment(&mut self) -> CompileResult<Token> {
        let mut analyzer = ExpressionAnalyzer::new(&mut self.symbols, &mut self.emitter, &self.options);
        analyzer.analyze(&mut self.tokens, ExpressionMode::Assignment)
    }

    fn peek(&mut self) -> CompileResult<&Token> {
        self.tokens.peek(&mut self.symbols)
    }

    fn advance(&mut self) -> CompileResult<Token> {
        self.tokens.advance(&mut self.symbols)
    }

    fn emit<const N: usize>(&mut self, opcode: Opcode, operands: [Operand; N]) {
        self.emitter.emit_op(opcode, operands);
    }

    /// Pop the top frame and restore what it shadowed.
    fn close_frame(&mut self) {
        let cleanup = self.symbols.pop_frame();
        self.emit_cleanup(cleanup);
    }

    fn emit_cleanup(&mut self, identifiers: Vec<String>) {
        for identifier in identifiers {
            self.emit(Opcode::PopS, [Operand::var(identifier)]);
        }
    }

    fn skip_eols(&mut self) -> CompileResult<()> {
        while self.peek()?.kind == TokenKind::Eol {
            self.advance()?;
        }
        Ok(())
    }

    fn expect_eol(&mut self) -> CompileResult<()> {
        let token = self.advance()?;
        if token.kind != TokenKind::Eol {
            return Err(CompileError::syntax(format!("expected end of line, found {}", token.describe())).with_token(&token));
        }
        Ok(())
    }

    fn expect_keyword(&mut self, keyword: KeywordId) -> CompileResult<Token> {
        let token = self.advance()?;
        if !token.is_keyword(keyword) {
            return Err(CompileError::syntax(format!(
                "expected '{}', found {}",
                keywords::as_str(keyword),
                token.describe()
            ))
            .with_token(&token));
        }
        Ok(token)
    }

    /// `End <keyword>`
    fn expect_end(&mut self, keyword: KeywordId) -> CompileResult<()> {
        self.expect_keyword(KeywordId::End)?;
        self.expect_keyword(keyword)?;
        Ok(())
    }

    fn expect_punctuation(&mut self, id: PunctuationId) -> CompileResult<Token> {
        let token = self.advance()?;
        if !token.is_punctuation(id) {
            return Err(CompileError::syntax(format!(
                "expected '{}', found {}",
                punctuation::as_str(id),
                token.describe()
            ))
            .with_token(&token));
        }
        Ok(token)
    }

    fn expect_operator(&mut self, id: OperatorId) -> CompileResult<Token> {
        let token = self.advance()?;
        if !token.is_operator(id) {
            return Err(CompileError::syntax(format!(
                "expected '{}', found {}",
                operators::as_str(id),
                token.describe()
            ))
            .with_token(&token));
        }
        Ok(token)
    }

    fn expect_identifier(&mut self) -> CompileResult<Token> {
        let token = self.advance()?;
        if token.kind != TokenKind::Identifier {
            return Err(CompileError::syntax(format!("expected an identifier, found {}", token.describe())).with_token(&token));
        }
        Ok(token)
    }

    fn expect_type(&mut self) -> CompileResult<DataType> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::DataType(data_type) => Ok(data_type),
            _ => Err(CompileError::syntax(format!("expected a type name, found {}", token.describe())).with_token(&token)),
        }
    }
}

#[cfg(test)]
mod tests;
