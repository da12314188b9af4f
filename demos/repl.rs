use parenlang::builtinops::{Arity, get_builtin_ops};
use parenlang::environment::Binding;
use parenlang::intooperation::{NumIter, StringIter};
use parenlang::{Environment, HostNamespace, Value, execute};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    env_logger::init();

    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

/// Host functions callable from the prompt in head position
fn host_namespace() -> HostNamespace {
    fn max(nums: NumIter<'_>) -> f64 {
        nums.fold(f64::NEG_INFINITY, f64::max)
    }

    fn upper(s: &str) -> Value {
        Value::string(s.to_uppercase())
    }

    fn join(sep: &str, parts: StringIter<'_>) -> Value {
        Value::string(parts.collect::<Vec<_>>().join(sep))
    }

    fn len(value: Value) -> f64 {
        let count = match &value {
            Value::List(items) => items.len(),
            Value::Str(_) => value.str_content().map_or(0, |s| s.chars().count()),
            _ => 1,
        };
        count as f64
    }

    let mut host = HostNamespace::new();
    host.register_variadic_operation::<_, (NumIter<'static>,)>("max", Arity::AtLeast(1), max);
    host.register_operation::<_, (&str,)>("upper", upper);
    host.register_variadic_operation::<_, (&str, StringIter<'static>)>("join", Arity::AtLeast(1), join);
    host.register_operation::<_, (Value,)>("len", len);
    host
}

fn run_repl() {
    println!("parenlang - parenthesized list-language interpreter");
    println!("Enter expressions like: (+ 1 2)");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let host = host_namespace();
    let host_names: Vec<String> = host.names().into_iter().map(str::to_owned).collect();

    let mut env = Environment::new();
    env.set_resolver(host);

    loop {
        match rl.readline("paren> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help(&host_names);
                        continue;
                    }
                    ":env" => {
                        print_environment(&env);
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                println!("{}", execute(line, &mut env));
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help(host_names: &[String]) {
    println!("Commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Builtins:");
    for op in get_builtin_ops() {
        println!("  {:<6} ({} arguments)", op.id, op.arity);
    }
    println!("  def    (exactly 2 arguments) - (def name value)");
    println!();
    println!("Host functions: {}", host_names.join(", "));
    println!();
    println!("Examples:");
    println!("  (+ 1 2 3)");
    println!("  (+ \"ab\" \"cd\")");
    println!("  (def xs (1 2 3))");
    println!("  (tail xs)");
    println!("  (max 3 9 4)");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    println!();

    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, binding) in bindings {
        match binding {
            Binding::Builtin(_) => builtins.push(name),
            Binding::Value(value) => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in functions ({}):", builtins.len());
        let mut col = 0;
        for name in builtins {
            print!("  {name:<15}");
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}
