use std::ffi::c_int;
use std::path::Path;

use dynbuild_lib::{BuildError, BuildingContext, Source, Symbol};

use super::common::{ADD, SQUARE_AND_IDENTITY, SYNTAX_ERROR, TestEnv};

type Unary = unsafe extern "C" fn(c_int) -> c_int;
type Binary = unsafe extern "C" fn(c_int, c_int) -> c_int;

#[test]
fn add_two_numbers() {
  let Some(mut env) = TestEnv::new() else { return };
  env.builder.add_target(Source::new(ADD));

  let library = env.builder.build().unwrap();
  assert!(library.is_loaded(), "{:?}", library.load_error());

  let add: Symbol<Binary> = unsafe { library.resolve_function("add") }.unwrap();
  assert_eq!(unsafe { add(2, 3) }, 5);
}

#[test]
fn two_entry_points_in_one_unit() {
  let Some(mut env) = TestEnv::new() else { return };
  env.builder.add_target(Source::new(SQUARE_AND_IDENTITY));

  let library = env.builder.build().unwrap();

  let square: Symbol<Unary> = unsafe { library.resolve_function("square") }.unwrap();
  let identity: Symbol<Unary> = unsafe { library.resolve_function("identity") }.unwrap();

  assert_eq!(unsafe { square(12) }, 144);
  assert_eq!(unsafe { identity(12) }, 12);
}

#[test]
fn syntax_error_is_compile_error() {
  let Some(mut env) = TestEnv::new() else { return };
  env.builder.add_target(Source::new(SYNTAX_ERROR));

  let err = env.builder.build().unwrap_err();

  assert!(matches!(err, BuildError::Compile { .. }), "{:?}", err);
  assert!(!err.stderr().unwrap().trim().is_empty());
  assert!(err.to_string().contains("compilation of"));
}

#[test]
fn failing_target_stops_later_targets() {
  let Some(mut env) = TestEnv::new() else { return };
  env
    .builder
    .add_named_target(Source::new(SYNTAX_ERROR), "broken.o")
    .unwrap();
  env.builder.add_named_target(Source::new(ADD), "add.o").unwrap();

  assert!(env.builder.build().is_err());

  assert!(!env.temp.path().join("add.o").exists());
  let modules = std::fs::read_dir(env.temp.path())
    .unwrap()
    .filter_map(Result::ok)
    .filter(|entry| entry.file_name().to_string_lossy().starts_with("exec_"))
    .count();
  assert_eq!(modules, 0);
}

#[test]
fn objects_from_several_targets_link_together() {
  let Some(mut env) = TestEnv::new() else { return };
  env.builder.add_named_target(Source::new(ADD), "add.o").unwrap();
  env
    .builder
    .add_named_target(Source::new(SQUARE_AND_IDENTITY), "square.o")
    .unwrap();

  let library = env.builder.build().unwrap();

  assert!(library.resolve("add").is_ok());
  assert!(library.resolve("square").is_ok());
  // Objects are left on disk after linking
  assert!(env.temp.path().join("add.o").exists());
  assert!(env.temp.path().join("square.o").exists());
}

#[test]
fn rebuilding_produces_independent_libraries() {
  let Some(mut env) = TestEnv::new() else { return };
  env.builder.add_target(Source::new(ADD));

  let first = env.builder.build().unwrap();
  let second = env.builder.build().unwrap();

  assert_ne!(first.path(), second.path());
  for library in [&first, &second] {
    let add: Symbol<Binary> = unsafe { library.resolve_function("add") }.unwrap();
    assert_eq!(unsafe { add(20, 22) }, 42);
  }
}

#[test]
fn context_defines_reach_the_compiler() {
  let Some(mut env) = TestEnv::new() else { return };
  let mut context = BuildingContext::new();
  context.add_define("ANSWER=42");
  env.builder.set_context(context);
  env
    .builder
    .add_target(Source::new(r#"extern "C" int answer() { return ANSWER; }"#));

  let library = env.builder.build().unwrap();

  let answer: Symbol<unsafe extern "C" fn() -> c_int> = unsafe { library.resolve_function("answer") }.unwrap();
  assert_eq!(unsafe { answer() }, 42);
}

#[test]
fn module_lands_in_output_dir() {
  let Some(mut env) = TestEnv::new() else { return };
  env.builder.add_target(Source::new(ADD));

  let library = env.builder.build().unwrap();

  let expected = dunce::canonicalize(env.temp.path()).unwrap();
  assert_eq!(library.path().parent(), Some(Path::new(&expected)));
}
