use pzero::mach::{compile, Event, Vm};

/// Safety limit for runaway programs under test.
const MAX_STEPS: usize = 100_000;

/// Compile and run a program, answering reads from `inputs` in order.
/// Output values and any diagnostic arrive one per line.
pub fn transcript(source: &str, inputs: &[i64]) -> String {
    let program = match compile(source) {
        Ok((program, _)) => program,
        Err(error) => return format!("{}\n", error),
    };
    let vm = match Vm::load(&program) {
        Ok(vm) => vm,
        Err(error) => return format!("{}\n", error),
    };
    drive(vm, inputs).0
}

/// Run an already loaded machine to completion. Returns the transcript
/// and the machine for register inspection.
pub fn drive(mut vm: Vm, inputs: &[i64]) -> (String, Vm) {
    let mut inputs = inputs.iter();
    let mut s = String::new();
    for _ in 0..MAX_STEPS {
        match vm.step() {
            Ok(Event::Stepped) => {}
            Ok(Event::Output(value)) => s.push_str(&format!("{}\n", value)),
            Ok(Event::Input) => {
                let value = inputs.next().expect("program wanted more input");
                if let Err(error) = vm.input(*value) {
                    s.push_str(&format!("{}\n", error));
                    return (s, vm);
                }
            }
            Ok(Event::Stopped) => return (s, vm),
            Err(error) => {
                s.push_str(&format!("{}\n", error));
                return (s, vm);
            }
        }
    }
    s.push_str("STEP LIMIT EXCEEDED\n");
    (s, vm)
}

/// Run to completion collecting every trace line, one per retired
/// instruction.
pub fn trace(mut vm: Vm, inputs: &[i64]) -> String {
    let mut inputs = inputs.iter();
    let mut s = String::new();
    for _ in 0..MAX_STEPS {
        let event = vm.step().expect("step failed");
        if let Event::Input = event {
            vm.input(*inputs.next().expect("program wanted more input"))
                .expect("input failed");
        }
        s.push_str(&format!("{}\n", vm.trace()));
        if let Event::Stopped = event {
            return s;
        }
    }
    panic!("step limit exceeded");
}
