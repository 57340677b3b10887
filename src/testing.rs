//! Test doubles for the process, privilege and clock seams

use crate::clock::Clock;
use crate::privilege::Privilege;
use crate::process::{CommandOutput, CommandRunner};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Fixed elevation answer
pub struct FixedPrivilege(pub bool);

impl Privilege for FixedPrivilege {
    fn is_elevated(&self) -> bool {
        self.0
    }
}

/// Clock that only advances when slept on
pub struct ManualClock {
    now: Cell<Instant>,
    slept: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            now: Cell::new(Instant::now()),
            slept: Cell::new(Duration::ZERO),
        })
    }

    pub fn total_slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Clock for Rc<ManualClock> {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
        self.slept.set(self.slept.get() + duration);
    }
}

/// One recorded utility invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub args: Vec<String>,
    pub at: Instant,
}

impl Call {
    pub fn verb(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FakeState {
    Stopped,
    Running,
    StopPending(usize),
}

#[derive(Debug, Default)]
struct FakeService {
    state: Option<FakeState>,
    props: HashMap<String, String>,
}

#[derive(Default)]
struct FakeInner {
    services: HashMap<String, FakeService>,
    calls: Vec<Call>,
    failing: Vec<String>,
    stop_pending_polls: usize,
    stop_never_completes: bool,
    utf16_output: bool,
}

/// In-memory stand-in for the NSSM command line
pub struct FakeNssm {
    clock: Rc<ManualClock>,
    inner: RefCell<FakeInner>,
}

impl FakeNssm {
    pub fn new(clock: Rc<ManualClock>) -> Self {
        Self {
            clock,
            inner: RefCell::new(FakeInner::default()),
        }
    }

    /// Pre-register a service in the given state
    pub fn with_service(self, name: &str, running: bool) -> Self {
        let state = if running {
            FakeState::Running
        } else {
            FakeState::Stopped
        };
        self.inner.borrow_mut().services.insert(
            name.to_string(),
            FakeService {
                state: Some(state),
                props: HashMap::new(),
            },
        );
        self
    }

    /// Make every invocation of `verb` exit with code 1
    pub fn failing(self, verb: &str) -> Self {
        self.inner.borrow_mut().failing.push(verb.to_string());
        self
    }

    /// Number of status polls a stopping service stays pending for
    pub fn stop_pending_polls(self, polls: usize) -> Self {
        self.inner.borrow_mut().stop_pending_polls = polls;
        self
    }

    /// A stopping service never reaches the stopped state
    pub fn stop_never_completes(self) -> Self {
        self.inner.borrow_mut().stop_never_completes = true;
        self
    }

    /// Emit output as raw UTF-16LE pipe bytes, like the real utility
    pub fn utf16_output(self) -> Self {
        self.inner.borrow_mut().utf16_output = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    pub fn verbs(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.verb().to_string()).collect()
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.inner.borrow().services.contains_key(name)
    }

    pub fn property(&self, name: &str, prop: &str) -> Option<String> {
        self.inner
            .borrow()
            .services
            .get(name)
            .and_then(|s| s.props.get(prop).cloned())
    }

    fn respond(inner: &mut FakeInner, args: &[String]) -> CommandOutput {
        let verb = args.first().map(String::as_str).unwrap_or("");
        let name = args.get(1).cloned().unwrap_or_default();

        if inner.failing.iter().any(|v| v == verb) {
            return exit(1, "", "simulated failure");
        }

        match verb {
            "install" => {
                if inner.services.contains_key(&name) {
                    return exit(5, "", "Error creating service!");
                }
                let mut service = FakeService {
                    state: Some(FakeState::Stopped),
                    props: HashMap::new(),
                };
                if let Some(path) = args.get(2) {
                    service.props.insert("Application".to_string(), path.clone());
                }
                inner.services.insert(name, service);
                exit(0, "Service installed successfully!", "")
            }
            "set" => match inner.services.get_mut(&name) {
                Some(service) => {
                    let prop = args.get(2).cloned().unwrap_or_default();
                    let value = args.get(3).cloned().unwrap_or_default();
                    service.props.insert(prop, value);
                    exit(0, "Set parameter", "")
                }
                None => exit(3, "", "Can't open service!"),
            },
            "get" => match inner.services.get(&name) {
                Some(service) => {
                    let prop = args.get(2).cloned().unwrap_or_default();
                    let value = service.props.get(&prop).cloned().unwrap_or_default();
                    exit(0, &format!("{}\r\n", value), "")
                }
                None => exit(3, "", "Can't open service!"),
            },
            "start" => match inner.services.get_mut(&name) {
                Some(service) => {
                    service.state = Some(FakeState::Running);
                    exit(0, "local-synk: START: The operation completed successfully.", "")
                }
                None => exit(3, "", "Can't open service!"),
            },
            "stop" => {
                let pending = inner.stop_pending_polls;
                let never = inner.stop_never_completes;
                match inner.services.get_mut(&name) {
                    Some(service) if service.state == Some(FakeState::Running) => {
                        service.state = Some(if never {
                            FakeState::StopPending(usize::MAX)
                        } else if pending > 0 {
                            FakeState::StopPending(pending)
                        } else {
                            FakeState::Stopped
                        });
                        exit(0, "STOP: The operation completed successfully.", "")
                    }
                    Some(_) => exit(1, "", "The service has not been started."),
                    None => exit(3, "", "Can't open service!"),
                }
            }
            "status" => match inner.services.get_mut(&name) {
                Some(service) => {
                    let text = match service.state.clone() {
                        Some(FakeState::Running) => "SERVICE_RUNNING",
                        Some(FakeState::StopPending(left)) => {
                            if left <= 1 {
                                service.state = Some(FakeState::Stopped);
                            } else if left != usize::MAX {
                                service.state = Some(FakeState::StopPending(left - 1));
                            }
                            "SERVICE_STOP_PENDING"
                        }
                        Some(FakeState::Stopped) | None => "SERVICE_STOPPED",
                    };
                    exit(0, &format!("{}\r\n", text), "")
                }
                None => exit(3, "", "Can't open service!"),
            },
            "remove" => {
                if args.get(2).map(String::as_str) != Some("confirm") {
                    return exit(1, "", "remove requires confirmation");
                }
                match inner.services.remove(&name) {
                    Some(_) => exit(0, "Service removed successfully!", ""),
                    None => exit(3, "", "Can't open service!"),
                }
            }
            _ => exit(1, "", "unknown verb"),
        }
    }
}

impl CommandRunner for FakeNssm {
    fn run(&self, _program: &Path, args: &[OsString]) -> io::Result<CommandOutput> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(Call {
            args: args.clone(),
            at: self.clock.now(),
        });
        let output = Self::respond(&mut inner, &args);
        if inner.utf16_output {
            return Ok(CommandOutput::from_raw(
                output.code,
                &utf16le(&output.stdout),
                &utf16le(&output.stderr),
            ));
        }
        Ok(output)
    }
}

fn exit(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

/// Encode text the way NSSM writes it to a pipe
pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}
