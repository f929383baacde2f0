use std::io::Write;

use tempfile::NamedTempFile;
use ttgetopt::{Environment, Mode, OptionTable, ParseError, Parser};

fn parser(mode: Mode) -> Parser {
    Parser::new(mode)
        .env(Environment::default().with_home("/opt/timesten"))
}

// -- Scalars -----------------------------------------------------------------

#[test]
fn flag_int_and_operand() {
    let (mut verbose, mut n) = (false, 0);
    let table = OptionTable::new()
        .help("usage...")
        .flag("v", &mut verbose)
        .int("n", &mut n);
    let idx = parser(Mode::ABBREV)
        .parse(&["prog", "-v", "-n", "5", "extra"], table)
        .unwrap();
    assert_eq!(idx, 4);
    assert!(verbose);
    assert_eq!(n, 5);
}

#[test]
fn help_without_exit_advances_cursor() {
    let (mut verbose, mut n) = (false, 0);
    let table = OptionTable::new()
        .help("Usage: <CMD> [-v]\n")
        .flag("v", &mut verbose)
        .int("n", &mut n);
    let idx = parser(Mode::ABBREV | Mode::NO_EXIT)
        .parse(&["prog", "-h"], table)
        .unwrap();
    assert_eq!(idx, 2);
}

#[test]
fn int_round_trip() {
    let mut x = 0;
    let table = OptionTable::new().int("n", &mut x);
    assert_eq!(parser(Mode::empty()).parse(&["prog", "-n", "42"], table), Ok(2));
    assert_eq!(x, 42);
}

#[test]
fn trailing_garbage_leaves_destination() {
    let (mut n, mut l, mut d) = (7, 8i64, 9.5);
    let table = OptionTable::new()
        .int("n", &mut n)
        .long("l", &mut l)
        .double("d", &mut d);
    let err = parser(Mode::empty())
        .parse(&["prog", "-n", "12x"], table)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "prog: option n: trailing garbage in numeric argument '12x'"
    );
    assert_eq!((n, l, d), (7, 8, 9.5));
}

#[test]
fn double_underflow_is_out_of_range() {
    let mut d = 1.5;
    let table = OptionTable::new().double("d", &mut d);
    let err = parser(Mode::empty())
        .parse(&["prog", "-d", "1e-400"], table)
        .unwrap_err();
    assert_eq!(
        err.messages(),
        vec!["prog: option d: numeric argument '1e-400' out of range"]
    );
    assert_eq!(d, 1.5);
}

#[test]
fn numeric_range_and_missing() {
    let (mut n, mut u) = (0, 0u32);
    let table = OptionTable::new().int("n", &mut n).unsigned("u", &mut u);
    let err = parser(Mode::empty())
        .parse(&["prog", "-n", "3000000000", "-u"], table)
        .unwrap_err();
    assert_eq!(
        err.messages(),
        vec!["prog: option n: numeric argument '3000000000' out of range"]
    );

    let table = OptionTable::new().int("n", &mut n).unsigned("u", &mut u);
    let err = parser(Mode::empty())
        .parse(&["prog", "-u", "0x10", "-n"], table)
        .unwrap_err();
    assert_eq!(err.messages(), vec!["prog: option n missing argument"]);
    assert_eq!(u, 16);
}

#[test]
fn string_length_limit() {
    let mut name = String::from("keep");
    let table = OptionTable::new().string("name", &mut name, 5);
    let err = parser(Mode::empty())
        .parse(&["prog", "-name", "toolong"], table)
        .unwrap_err();
    assert_eq!(err.messages(), vec!["prog: option name is too long (max 5)"]);
    assert_eq!(name, "keep");
}

#[test]
fn string_int_pair() {
    let (mut text, mut num) = (String::new(), 0);
    let table = OptionTable::new().string_int("pair", &mut text, 16, &mut num);
    let idx = parser(Mode::empty())
        .parse(&["prog", "-pair", "alpha", "9", "rest"], table)
        .unwrap();
    assert_eq!(idx, 4);
    assert_eq!((text.as_str(), num), ("alpha", 9));
}

#[test]
fn string_int_checks_both_before_writing() {
    let (mut text, mut num) = (String::new(), 0);
    let table = OptionTable::new().string_int("pair", &mut text, 16, &mut num);
    let err = parser(Mode::empty())
        .parse(&["prog", "-pair", "alpha", "nine"], table)
        .unwrap_err();
    assert_eq!(
        err.messages(),
        vec!["prog: option pair: bad numeric argument 'nine'"]
    );
    assert!(text.is_empty());
}

// -- Matching ----------------------------------------------------------------

#[test]
fn abbreviation_ambiguity() {
    let (mut a, mut b) = (0, 0);
    let table = OptionTable::new().int("number", &mut a).int("num2", &mut b);
    let err = parser(Mode::ABBREV)
        .parse(&["prog", "-num", "1"], table)
        .unwrap_err();
    assert_eq!(err.messages(), vec!["prog: unknown option '-num'"]);

    let table = OptionTable::new().int("number", &mut a).int("num2", &mut b);
    assert_eq!(parser(Mode::ABBREV).parse(&["prog", "-numb", "1"], table), Ok(3));
    assert_eq!(a, 1);
}

#[test]
fn abbreviation_needs_mode() {
    let mut a = 0;
    let table = OptionTable::new().int("number", &mut a);
    assert!(parser(Mode::empty()).parse(&["prog", "-numb", "1"], table).is_err());
}

#[test]
fn case_rules() {
    let mut records = 0;
    let table = OptionTable::new().int("records", &mut records);
    assert_eq!(parser(Mode::empty()).parse(&["prog", "-RECORDS", "4"], table), Ok(3));
    assert_eq!(records, 4);

    let table = OptionTable::new().int("records", &mut records);
    assert!(parser(Mode::CASE_SENSITIVE)
        .parse(&["prog", "-RECORDS", "4"], table)
        .is_err());
}

#[test]
fn negatable_flag() {
    let mut color = true;
    let table = OptionTable::new().negatable("color", &mut color);
    parser(Mode::empty()).parse(&["prog", "-nocolor"], table).unwrap();
    assert!(!color);

    let table = OptionTable::new().negatable("color", &mut color);
    parser(Mode::empty()).parse(&["prog", "--color"], table).unwrap();
    assert!(color);
}

#[test]
fn unknown_options_are_collected_or_ignored() {
    let mut v = false;
    let table = OptionTable::new().flag("v", &mut v);
    let err = parser(Mode::empty())
        .parse(&["prog", "-x", "-y", "-v"], table)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "prog: unknown option '-x'\nprog: unknown option '-y'"
    );
    assert!(v);

    let table = OptionTable::new().flag("v", &mut v);
    assert_eq!(
        parser(Mode::IGNORE_UNKNOWNS).parse(&["prog", "-x", "-v", "op"], table),
        Ok(3)
    );
}

#[test]
fn integer_and_real_options() {
    let mut lines = 0;
    let table = OptionTable::new().integer(&mut lines);
    assert_eq!(parser(Mode::empty()).parse(&["prog", "-20"], table), Ok(2));
    assert_eq!(lines, 20);

    let mut scale = 0.0;
    let table = OptionTable::new().real(&mut scale);
    assert_eq!(parser(Mode::empty()).parse(&["prog", "-1.5"], table), Ok(2));
    assert_eq!(scale, 1.5);
}

#[test]
fn command_name_in_messages() {
    let mut n = 0;
    let table = OptionTable::new().int("n", &mut n);
    let err = parser(Mode::empty())
        .parse(&["/usr/bin/_bulkCmd", "-q"], table)
        .unwrap_err();
    assert_eq!(err.to_string(), "bulk: unknown option '-q'");
}

// -- Arrays ------------------------------------------------------------------

#[test]
fn array_capacity() {
    let mut ids = Vec::new();
    let table = OptionTable::new().int_array("ids", &mut ids, 3);
    let err = parser(Mode::empty())
        .parse(&["prog", "-ids", "1", "2", "3", "4"], table)
        .unwrap_err();
    assert_eq!(err.messages(), vec!["prog: too many ids options specified"]);
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn array_stops_at_non_element() {
    let (mut vals, mut v) = (Vec::new(), false);
    let table = OptionTable::new()
        .double_array("vals", &mut vals, 8)
        .flag("v", &mut v);
    let idx = parser(Mode::empty())
        .parse(&["prog", "-vals", "1", "2.5", "-v", "file"], table)
        .unwrap();
    assert_eq!(idx, 5);
    assert_eq!(vals, vec![1.0, 2.5]);
    assert!(v);
}

#[test]
fn array_negative_numbers_are_elements() {
    let mut ids = Vec::new();
    let table = OptionTable::new().int_array("ids", &mut ids, 8);
    parser(Mode::empty())
        .parse(&["prog", "-ids", "-1", "2"], table)
        .unwrap();
    assert_eq!(ids, vec![-1, 2]);
}

#[test]
fn empty_array() {
    let (mut names, mut v) = (Vec::new(), false);
    let table = OptionTable::new()
        .string_array("names", &mut names, 8)
        .flag("v", &mut v);
    let err = parser(Mode::empty())
        .parse(&["prog", "-names", "-v"], table)
        .unwrap_err();
    assert_eq!(err.messages(), vec!["prog: No arguments to names"]);

    let table = OptionTable::new()
        .string_array("names", &mut names, 8)
        .flag("v", &mut v);
    assert_eq!(
        parser(Mode::EMPTY_LIST_OK).parse(&["prog", "-names", "-v"], table),
        Ok(3)
    );
    assert!(names.is_empty());
}

#[test]
fn string_array_leaves_last_word_for_dsn() {
    let (mut names, mut dsn) = (Vec::new(), String::new());
    let table = OptionTable::new()
        .string_array("names", &mut names, 8)
        .dsn(&mut dsn, 32);
    let idx = parser(Mode::empty())
        .parse(&["prog", "-names", "a", "b", "sampledb"], table)
        .unwrap();
    assert_eq!(idx, 5);
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(dsn, "sampledb");
}

// -- DSN and connection string -----------------------------------------------

#[test]
fn positional_dsn_and_connstr() {
    let (mut dsn, mut conn) = (String::new(), String::new());
    let table = OptionTable::new().dsn(&mut dsn, 32).connstr(&mut conn, 128);
    assert_eq!(parser(Mode::empty()).parse(&["prog", "sampledb"], table), Ok(2));
    assert_eq!(dsn, "sampledb");

    let (mut dsn, mut conn) = (String::new(), String::new());
    let table = OptionTable::new().dsn(&mut dsn, 32).connstr(&mut conn, 128);
    assert_eq!(
        parser(Mode::empty()).parse(&["prog", "DSN=sampledb;UID=app"], table),
        Ok(2)
    );
    assert_eq!(conn, "DSN=sampledb;UID=app");
    assert!(dsn.is_empty());
}

#[test]
fn explicit_connstr_option() {
    let mut conn = String::new();
    let table = OptionTable::new().connstr(&mut conn, 128);
    let idx = parser(Mode::empty())
        .parse(&["prog", "-connStr", "DSN=x", "op"], table)
        .unwrap();
    assert_eq!(idx, 3);
    assert_eq!(conn, "DSN=x");
}

#[test]
fn dsn_and_connstr_are_exclusive() {
    let (mut dsn, mut conn) = (String::new(), String::new());
    let table = OptionTable::new().dsn(&mut dsn, 32).connstr(&mut conn, 128);
    let err = parser(Mode::empty())
        .parse(&["prog", "-dsn", "a", "-connstr", "DSN=b"], table)
        .unwrap_err();
    assert_eq!(
        err.messages(),
        vec!["prog: option -connstr: a DSN or connection string was already given"]
    );
}

#[test]
fn connstr_from_environment() {
    let mut conn = String::new();
    let table = OptionTable::new().connstr(&mut conn, 128);
    let p = Parser::new(Mode::empty())
        .env(Environment::default().with_home("/tt").with_connstr("DSN=envdb"));
    assert_eq!(p.parse(&["prog"], table), Ok(1));
    assert_eq!(conn, "DSN=envdb");

    let table = OptionTable::new().connstr(&mut conn, 128);
    let p = Parser::new(Mode::IGNORE_CONNSTR_ENV)
        .env(Environment::default().with_home("/tt").with_connstr("DSN=envdb"));
    let err = p.parse(&["prog"], table).unwrap_err();
    assert_eq!(err.messages(), vec!["prog: No connection string given."]);
}

#[test]
fn environment_value_too_long() {
    let mut conn = String::new();
    let table = OptionTable::new().connstr(&mut conn, 4);
    let p = Parser::new(Mode::empty())
        .env(Environment::default().with_home("/tt").with_connstr("DSN=envdb"));
    let err = p.parse(&["prog"], table).unwrap_err();
    assert_eq!(
        err.messages(),
        vec!["prog: TT_CONNSTR connection string value is too long (max 4)"]
    );
}

#[test]
fn missing_connection_messages() {
    let (mut dsn, mut conn) = (String::new(), String::new());
    let table = OptionTable::new().dsn(&mut dsn, 32).connstr(&mut conn, 128);
    let err = parser(Mode::empty()).parse(&["prog"], table).unwrap_err();
    assert_eq!(err.messages(), vec!["prog: No DSN or connection string given."]);

    let table = OptionTable::new().dsn(&mut dsn, 32);
    let err = parser(Mode::empty()).parse(&["prog", "a/b"], table).unwrap_err();
    assert_eq!(err.messages(), vec!["prog: No DSN given."]);

    let table = OptionTable::new().dsn(&mut dsn, 32);
    assert_eq!(parser(Mode::NO_CONNSTR_OK).parse(&["prog"], table), Ok(1));
}

// -- Callbacks ---------------------------------------------------------------

#[test]
fn callback_sees_every_value() {
    let mut seen = Vec::new();
    let table = OptionTable::new().callback("hook", |opt, val| seen.push(format!("{}={}", opt, val)));
    parser(Mode::ABBREV)
        .parse(&["prog", "-hook", "a", "-ho", "b"], table)
        .unwrap();
    assert_eq!(seen, vec!["hook=a", "hook=b"]);
}

#[test]
fn handler_can_reject() {
    let check = |_: &str, val: &str| -> Result<(), String> {
        if val.parse::<u16>().is_ok() {
            Ok(())
        } else {
            Err(format!("'{}' is not a port", val))
        }
    };
    let table = OptionTable::new().handler("port", check);
    let err = parser(Mode::empty())
        .parse(&["prog", "-port", "http"], table)
        .unwrap_err();
    assert_eq!(err.messages(), vec!["prog: 'http' is not a port"]);
}

#[test]
fn help_and_version_functions() {
    let (mut helped, mut versioned) = (0, 0);
    let table = OptionTable::new()
        .help_fn(|| helped += 1)
        .version_fn(|| versioned += 1);
    parser(Mode::empty())
        .parse(&["prog", "-?", "-version", "-help"], table)
        .unwrap();
    assert_eq!((helped, versioned), (2, 1));
}

// -- Other sources -----------------------------------------------------------

#[test]
fn options_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# tool options").unwrap();
    writeln!(file, "-records 100").unwrap();
    writeln!(file, "-title \"nightly run\"").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "-verbose").unwrap();

    let (mut records, mut title, mut verbose) = (0, String::new(), false);
    let table = OptionTable::new()
        .int("records", &mut records)
        .string("title", &mut title, 64)
        .flag("verbose", &mut verbose);
    let parsed = parser(Mode::empty())
        .parse_file(Some(file.path()), table)
        .unwrap();
    assert_eq!(parsed.index, parsed.args.len());
    assert!(parsed.remaining().is_empty());
    assert_eq!(records, 100);
    assert_eq!(title, "nightly run");
    assert!(verbose);
}

#[test]
fn options_from_string() {
    let (mut title, mut n) = (String::new(), 0);
    let table = OptionTable::new()
        .string("title", &mut title, 64)
        .int("n", &mut n);
    let parsed = parser(Mode::empty())
        .parse_str(r#"-title 'a b' -n 3 left over"#, "tool", table)
        .unwrap();
    assert_eq!(parsed.index, 5);
    assert_eq!(parsed.remaining(), ["left", "over"]);
    assert_eq!(title, "a b");
    assert_eq!(n, 3);
}

#[test]
fn string_source_errors() {
    let err = parser(Mode::empty())
        .parse_str("-title 'open", "tool", OptionTable::new())
        .unwrap_err();
    assert_eq!(err, ParseError::Source("tool: unmatched '".into()));
}

#[test]
fn file_and_string_do_not_need_home() {
    let p = Parser::new(Mode::empty()).env(Environment::default());
    assert!(p.parse_str("", "tool", OptionTable::new()).is_ok());
}

#[test]
fn string_and_file_errors_use_name_as_given() {
    let err = parser(Mode::empty())
        .parse_str("-zz", "loadCmd", OptionTable::new())
        .unwrap_err();
    assert_eq!(err.messages(), vec!["loadCmd: unknown option '-zz'"]);

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "-zz").unwrap();
    let name = file.path().to_str().unwrap().to_string();
    let err = parser(Mode::empty())
        .parse_file(Some(file.path()), OptionTable::new())
        .unwrap_err();
    assert_eq!(err.messages(), vec![format!("{}: unknown option '-zz'", name)]);
}
