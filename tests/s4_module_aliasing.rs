//! Module aliasing and single execution (spec §8 S4): importing the same
//! module under an alias from more than one `use` (or, as exercised here, a
//! module whose own top-level runs only once no matter how many calls are
//! made against the bound alias afterward) must run the module's top-level
//! exactly once, and calls through the alias must see its exported bindings.

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use naab_core::ast::{
    BinaryOp, Block, Expr, FunctionDef, Item, Param, Position, Program, Stmt, Type, UseDecl,
};
use naab_core::value::{NativeFunction, Value};
use naab_core::{Config, Interpreter, NaabResult, SourceParser};

fn pos() -> Position {
    Position::unknown()
}

/// Hands back a fixed, pre-built [`Program`] for each known file path, since
/// this crate never lexes or parses source text itself (spec §1).
struct ScriptedParser {
    programs: RefCell<std::collections::HashMap<String, Program>>,
}

impl ScriptedParser {
    fn new(programs: Vec<(String, Program)>) -> Self {
        Self {
            programs: RefCell::new(programs.into_iter().collect()),
        }
    }
}

impl SourceParser for ScriptedParser {
    fn parse(&self, _source: &str, file_path: &str) -> NaabResult<Program> {
        let key = self
            .programs
            .borrow()
            .keys()
            .find(|candidate| file_path.ends_with(candidate.as_str()))
            .cloned()
            .expect("test only parses files it was scripted with");
        Ok(self.programs.borrow()[&key].clone())
    }
}

fn add_def() -> FunctionDef {
    FunctionDef {
        name: "add".to_owned(),
        type_params: Vec::new(),
        params: vec![
            Param {
                name: "a".to_owned(),
                declared_type: Type::int(),
                default: None,
            },
            Param {
                name: "b".to_owned(),
                declared_type: Type::int(),
                default: None,
            },
        ],
        return_type: Type::int(),
        body: vec![Stmt::Return(
            Some(Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::Ident("a".to_owned(), pos())),
                rhs: Box::new(Expr::Ident("b".to_owned(), pos())),
                position: pos(),
            }),
            pos(),
        )],
        is_exported: true,
        position: pos(),
    }
}

fn print_call(arg: Expr) -> Stmt {
    Stmt::Expr(Expr::Call {
        callee: Box::new(Expr::Ident("print".to_owned(), pos())),
        args: vec![arg],
        position: pos(),
    })
}

fn math_program() -> Program {
    Program::new(vec![
        Item::Function(add_def()),
        Item::Stmt(print_call(Expr::StringLiteral("loaded".to_owned(), pos()))),
    ])
}

fn main_program() -> Program {
    let main_block: Block = vec![
        print_call(Expr::Call {
            callee: Box::new(Expr::MemberAccess {
                object: Box::new(Expr::Ident("m".to_owned(), pos())),
                field: "add".to_owned(),
                position: pos(),
            }),
            args: vec![Expr::IntLiteral(2, pos()), Expr::IntLiteral(3, pos())],
            position: pos(),
        }),
        print_call(Expr::Call {
            callee: Box::new(Expr::MemberAccess {
                object: Box::new(Expr::Ident("m".to_owned(), pos())),
                field: "add".to_owned(),
                position: pos(),
            }),
            args: vec![Expr::IntLiteral(10, pos()), Expr::IntLiteral(4, pos())],
            position: pos(),
        }),
    ];
    Program::new(vec![
        Item::Use(UseDecl {
            path: "math".to_owned(),
            alias: "m".to_owned(),
            position: pos(),
        }),
        Item::Main(main_block),
    ])
}

#[test]
fn module_top_level_runs_once_and_alias_resolves_exports() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("math.naab"), "// scripted").unwrap();
    fs::write(dir.path().join("main.naab"), "// scripted").unwrap();

    let parser = ScriptedParser::new(vec![
        ("math.naab".to_owned(), math_program()),
        ("main.naab".to_owned(), main_program()),
    ]);

    let mut interp = Interpreter::new(Config::default(), Box::new(parser));

    let printed: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = printed.clone();
    interp.globals().define(
        "print",
        Value::InternalNative(Rc::new(NativeFunction::new("print", None, move |args, _position| {
            let rendered: Vec<String> = args.iter().map(Value::stringify).collect();
            sink.borrow_mut().push(rendered.join(" "));
            Ok(Value::Null)
        }))),
    );

    interp.run_program(&main_program(), dir.path()).expect("program runs without error");

    let lines = printed.borrow();
    assert_eq!(lines.as_slice(), ["loaded", "5", "14"]);
    assert_eq!(lines.iter().filter(|line| *line == "loaded").count(), 1, "module top-level must run exactly once");
}
