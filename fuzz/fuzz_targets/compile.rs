#![no_main]

use bascule::config::CompilerOptions;
use bascule::frontend::lexer;
use bascule::frontend::symbols::SymbolTable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw bytes go straight in; neither entry point requires UTF-8.
    let _ = bascule::driver::compile(data, &CompilerOptions::default());
    let _ = lexer::lex(data, &mut SymbolTable::default());
});
