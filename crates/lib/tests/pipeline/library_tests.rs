use std::ffi::c_int;

use dynbuild_lib::{Source, Symbol, SymbolError};

use super::common::{ADD, TestEnv};

#[test]
fn unknown_symbol_always_fails() {
  let Some(mut env) = TestEnv::new() else { return };
  env.builder.add_target(Source::new(ADD));
  let library = env.builder.build().unwrap();

  assert!(library.resolve("add").is_ok());
  for _ in 0..3 {
    assert!(matches!(library.resolve("subtract"), Err(SymbolError::NotFound { .. })));
  }
  assert!(library.resolve("add").is_ok());
  assert!(library.error_string().is_some());
}

#[test]
fn mangled_names_do_not_resolve() {
  let Some(mut env) = TestEnv::new() else { return };
  env
    .builder
    .add_target(Source::new("int mangled(int a) { return a; }"));
  let library = env.builder.build().unwrap();

  assert!(library.resolve("mangled").is_err());
}

#[test]
fn unloaded_library_refuses_resolution() {
  let Some(mut env) = TestEnv::new() else { return };
  env.builder.add_target(Source::new(ADD));
  let mut library = env.builder.build().unwrap();

  {
    let add: Symbol<unsafe extern "C" fn(c_int, c_int) -> c_int> = unsafe { library.resolve_function("add") }.unwrap();
    assert_eq!(unsafe { add(1, 1) }, 2);
  }

  assert!(library.unload());
  assert!(!library.is_loaded());
  assert!(matches!(library.resolve("add"), Err(SymbolError::NotLoaded { .. })));
}
