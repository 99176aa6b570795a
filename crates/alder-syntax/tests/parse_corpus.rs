//! Parse corpus: every statement and expression form the grammar supports,
//! fed through the full lex + parse pipeline.

use alder_ast::FileId;
use alder_syntax::parse_program_source;

#[test]
fn corpus_parses() {
    let cases: &[(&str, &str)] = &[
        // BASICS
        ("empty program", ""),
        ("single line comment", "/* hello */"),
        ("multi line comment", "/* \n one \n two */"),
        ("integer", "4"),
        ("template string", "`my string`"),
        ("boolean", "true"),
        // CONST DECLARATIONS
        ("plain const", "const foo = 4"),
        ("annotated const", "const foo: number = 4"),
        (
            "line break in const dec",
            "const foo =
                bar",
        ),
        ("object destructure", "const { a, b } = user"),
        ("array destructure", "const [x, y] = pair"),
        ("enum destructure", "const Option.Some(x) = opt"),
        // DATA
        ("array literal", "[one, two, three, four,]"),
        (
            "multiline array",
            "[one,
                two  ,   three ,
                four
                , five,
                ]",
        ),
        ("object literal", "const andrew = { name: `Andrew`, status: `Total Beast` }"),
        // IMPORTS
        ("single import", "import Browser.Dom expose (fetch, header)"),
        (
            "several imports",
            "import Browser expose (window, DomElement)
             import Net.Http expose (Request, Response)",
        ),
        // FUNCTION DEFINITIONS
        ("simple function", "() => {}"),
        ("function one param", "(x) => {}"),
        ("function two param", "(x, y) => {}"),
        ("annotated param", "(x: string) => {}"),
        ("mixed params", "(x, y: number, z, bar: SomeType) => {}"),
        ("spread param", "(...rest) => {}"),
        ("return annotation", "(x: number): number => x"),
        (
            "multiline function body",
            "(x) => {
                const two = 2
                x * two
            }",
        ),
        // CALLS
        ("basic call", "foobar()"),
        ("call with args", "add(1, 2)"),
        ("dot access", "foo.bar"),
        ("dot call", "foo.bar()"),
        ("index access", "items[0]"),
        ("enum call", "Option.Some(4)"),
        ("bare enum member", "Option.None"),
        // BINARY / UNARY
        ("addition", "12 + 7"),
        ("multiplication", "12 * 7"),
        ("subtraction", "12 - 7"),
        ("division", "12 / 7"),
        ("power", "2 ** 8"),
        ("equals", "12 == 7"),
        ("not equals", "12 != 7"),
        ("greater", "12 > 7"),
        ("less", "12 < 7"),
        ("and", "a && b"),
        ("or", "a || b"),
        ("not", "!done"),
        ("negate", "-4"),
        // TYPES
        ("simple type declaration", "type Foo = string"),
        (
            "record type",
            "type User = { name: string, age: number, }",
        ),
        ("generic box", "type Foo<F> = F"),
        (
            "record type with generics",
            "type Foo<T, Z> = { one: T, two: Z, }",
        ),
        ("variant type", "type Status = :Active | :Disabled"),
        // ENUMS
        ("minimal enum", "enum Foo { Bar }"),
        ("payload enum", "enum Foo { Bar(string) }"),
        (
            "multi-member enum",
            "enum Foo { Bar(string), Baz(number), Stan, }",
        ),
        ("generic enum", "enum Option<T> { Some(T), None, }"),
        // TEMPLATES
        ("template with span", "`hello ${name}`"),
        ("template with nested expr", "`total: ${1 + 2}`"),
        // IF / MATCH
        (
            "if else",
            "if foo == true {
                bar
            } else {
                baz
            }",
        ),
        (
            "simple match",
            "match foo {
                `foo` -> `bar`
            }",
        ),
        (
            "multi-clause match",
            "match response {
                bar -> `bar`
                baz -> `baz`
            }",
        ),
        (
            "enum pattern match",
            "match opt {
                Option.Some(x) -> x
                Option.None -> 0
            }",
        ),
        // JUMBO
        (
            "jumbo",
            "const foo = (x: number): number => if x > 10 { x * 2 } else { x * 5 }
             const meaningOfLife = 50 - 8
             const result = foo(meaningOfLife)",
        ),
    ];

    for (name, source) in cases {
        let moduled = format!("module Testing.Foo\n{source}");
        if let Err(errors) = parse_program_source(&moduled, FileId(0)) {
            panic!("case `{name}` failed to parse: {errors:?}");
        }
    }
}
