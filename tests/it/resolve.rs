use std::{
    ffi::{OsStr, OsString},
    panic::{self, AssertUnwindSafe},
};

use expect_test::expect;
use subcmd::{
    flag::{ErrorHandling, Value},
    parse, Command, Error,
};

use crate::{check, split, tree, Buf};

#[test]
fn classification() {
    check(&mut tree(&["test"]), "", expect!["NoCommand @ test"]);
    check(&mut tree(&["test"]), "-h", expect!["Help @ test"]);
    check(&mut tree(&["test"]), "-help", expect!["Help @ test"]);
    check(&mut tree(&["test", "cmd"]), "cmd", expect![[r#"test cmd []"#]]);
    check(&mut tree(&["test", "cmd"]), "a", expect![[r#"UnknownCommand("a") @ test"#]]);
    check(&mut tree(&["test", "cmd"]), "cmd -h", expect!["Help @ test cmd"]);
    check(&mut tree(&["test", "cmd"]), "cmd --help", expect!["Help @ test cmd"]);
    check(
        &mut tree(&["test", "cmd"]),
        "-x cmd",
        expect![[r#"Flag(Undefined("x")) @ test"#]],
    );
    check(
        &mut tree(&["test", "cmd"]),
        "cmd ---x",
        expect![[r#"Flag(BadSyntax("---x")) @ test cmd"#]],
    );
    check(&mut tree(&["test", "a", "b"]), "b x y", expect![[r#"test b ["x", "y"]"#]]);
}

#[test]
fn no_command_keeps_root_only() {
    let mut root = tree(&["test", "cmd"]);
    let failure = parse(&mut root, Vec::<OsString>::new()).unwrap_err();
    assert_eq!(failure.error, Error::NoCommand);
    assert_eq!(failure.invocation.path().len(), 1);
    assert_eq!(failure.invocation.command().name, "test");
    assert_eq!(failure.invocation.long_name(), "");
}

#[test]
fn matched_child_hangs_off_root() {
    let mut root = tree(&["test", "cmd"]);
    let invocation = parse(&mut root, ["cmd"]).unwrap();
    let path = invocation.path();
    assert_eq!(path.len(), 2);
    assert!(std::ptr::eq(path[0], invocation.root()));
    assert!(std::ptr::eq(path[1], &invocation.root().commands[0]));
    assert_eq!(invocation.long_name(), "cmd");
    assert_eq!(invocation.display_name(), "test cmd");
}

#[test]
fn commands_which_do_not_run_are_unknown() {
    let mut root = Command::new("test").with_subcommand(Command::new("cmd"));
    check(&mut root, "cmd", expect![[r#"UnknownCommand("cmd") @ test"#]]);

    let mut root = Command::new("test")
        .with_subcommand(Command::new("cmd").with_short("placeholder"))
        .with_subcommand(Command::new("cmd").with_short("real").with_run(|_, _| 0));
    let invocation = parse(&mut root, ["cmd"]).unwrap();
    assert_eq!(invocation.command().short, "real");
}

#[test]
fn first_match_wins() {
    let mut root = Command::new("test")
        .with_subcommand(Command::new("cmd").with_short("first").with_run(|_, _| 0))
        .with_subcommand(Command::new("cmd").with_short("second").with_run(|_, _| 0));
    let invocation = parse(&mut root, ["cmd"]).unwrap();
    assert_eq!(invocation.command().short, "first");
}

#[test]
fn only_one_level_is_resolved() {
    let mut root = tree(&["test", "cmd1"]);
    root.commands[0] = Command::new("cmd1")
        .with_run(|_, _| 0)
        .with_subcommand(Command::new("cmd2").with_run(|_, _| 0));
    check(&mut root, "cmd1 cmd2 -flag", expect![[r#"test cmd1 ["cmd2", "-flag"]"#]]);
}

#[test]
fn child_flag_and_argument() {
    let mut root = tree(&["test", "cmd"]);
    let flag = root.commands[0].flags.bool("flag", false, "flag");

    let invocation = parse(&mut root, split("cmd -flag arg")).unwrap();
    assert_eq!(invocation.args(), ["arg"]);
    assert_eq!(invocation.command().flags.arg(0), Some(OsStr::new("arg")));
    assert!(flag.get());
}

#[test]
fn custom_flags_are_passed_through() {
    let mut root = tree(&["test", "cmd"]);
    root.commands[0].custom_flags = true;
    let flag = root.commands[0].flags.bool("flag", false, "flag");

    let invocation = parse(&mut root, split("cmd -flag arg -h --")).unwrap();
    assert_eq!(invocation.args(), ["-flag", "arg", "-h", "--"]);
    assert!(!flag.get());
    assert!(!invocation.command().flags.parsed());
}

#[test]
fn root_flags_come_before_the_command() {
    let mut root = tree(&["test", "cmd", "other"]);
    let flag0 = root.flags.bool("flag0", false, "flag0");
    let level = root.flags.int("level", 0, "level");
    let flag1 = root.commands[0].flags.bool("flag1", false, "flag1");

    let invocation = parse(&mut root, split("-flag0 -level 3 other arg")).unwrap();
    assert_eq!(invocation.command().name, "other");
    assert_eq!(invocation.args(), ["arg"]);
    assert!(flag0.get());
    assert_eq!(level.get(), 3);
    assert!(!flag1.get());
}

#[test]
fn root_and_child_flags() {
    let mut root = tree(&["test", "cmd"]);
    let flag0 = root.flags.bool("flag0", false, "flag0");
    let flag1 = root.commands[0].flags.bool("flag1", false, "flag1");

    let invocation = parse(&mut root, split("-flag0 cmd -flag1 arg")).unwrap();
    assert_eq!(invocation.command().name, "cmd");
    assert_eq!(invocation.args(), ["arg"]);
    assert!(flag0.get());
    assert!(flag1.get());
}

#[test]
fn flags_after_the_command_belong_to_it() {
    let mut root = tree(&["test", "cmd"]);
    let verbose = root.flags.bool("v", false, "verbose");
    check(&mut root, "cmd -v", expect![[r#"Flag(Undefined("v")) @ test cmd"#]]);
    assert!(!verbose.get());
}

#[test]
fn output_and_policy_are_restored() {
    let root_out = Buf::default();
    let child_out = Buf::default();
    let mut root = tree(&["test", "cmd"]);
    root.flags.set_output(Box::new(root_out.clone()));
    root.flags.set_error_handling(ErrorHandling::Panic);
    root.commands[0].flags.set_output(Box::new(child_out.clone()));
    root.commands[0].flags.set_error_handling(ErrorHandling::Exit);

    assert!(parse(&mut root, split("-x")).is_err());
    assert!(parse(&mut root, split("cmd -y")).is_err());
    assert!(parse(&mut root, split("cmd -h")).is_err());
    assert_eq!(root_out.text(), "");
    assert_eq!(child_out.text(), "");
    assert_eq!(root.flags.error_handling(), ErrorHandling::Panic);
    assert_eq!(root.commands[0].flags.error_handling(), ErrorHandling::Exit);

    root.commands[0].flags.set_error_handling(ErrorHandling::Continue);
    assert!(root.commands[0].flags.parse(split("-y")).is_err());
    assert!(child_out.text().starts_with("flag provided but not defined: -y\n"));
}

#[test]
fn output_and_policy_survive_a_panicking_value() {
    struct Boom;
    impl Value for Boom {
        fn set(&mut self, _value: &str) -> Result<(), String> {
            panic!("boom")
        }
        fn render(&self) -> String {
            String::new()
        }
    }

    let child_out = Buf::default();
    let mut root = tree(&["test", "c"]);
    root.commands[0].flags.value("b", "explodes", Boom);
    root.commands[0].flags.set_output(Box::new(child_out.clone()));
    root.commands[0].flags.set_error_handling(ErrorHandling::Panic);

    let res = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = parse(&mut root, ["c", "-b", "x"]);
    }));
    assert!(res.is_err());
    assert_eq!(root.commands[0].flags.error_handling(), ErrorHandling::Panic);

    root.commands[0].flags.set_error_handling(ErrorHandling::Continue);
    assert!(root.commands[0].flags.parse(split("-z")).is_err());
    assert!(child_out.text().starts_with("flag provided but not defined: -z\n"));
}

#[test]
fn unknown_command_names_need_not_be_utf8() {
    let mut root = tree(&["test", "cmd"]);
    let name = not_utf8();
    let failure = parse(&mut root, [name.clone()]).unwrap_err();
    assert_eq!(failure.error, Error::UnknownCommand(name));
}

#[test]
fn custom_flags_receive_arguments_verbatim() {
    let mut root = tree(&["test", "cmd"]);
    root.commands[0].custom_flags = true;

    let invocation =
        parse(&mut root, [OsString::from("cmd"), not_utf8(), OsString::from("-x")]).unwrap();
    assert_eq!(invocation.args(), [not_utf8(), OsString::from("-x")]);
}

#[test]
fn positional_arguments_need_not_be_utf8() {
    let mut root = tree(&["test", "cmd"]);
    let flag = root.commands[0].flags.bool("flag", false, "flag");

    let invocation =
        parse(&mut root, [OsString::from("cmd"), OsString::from("-flag"), not_utf8()]).unwrap();
    assert_eq!(invocation.args(), [not_utf8()]);
    assert!(flag.get());
}

#[cfg(unix)]
fn not_utf8() -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(b"a\xffb".to_vec())
}

#[cfg(windows)]
fn not_utf8() -> OsString {
    use std::os::windows::ffi::OsStringExt;
    OsString::from_wide(&[0x61, 0xD800, 0x62])
}
