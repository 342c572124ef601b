use crate::il::*;
use crate::platform::{RegisterConvention, RegisterProperties};

/// A `Program` together with the platform metadata downstream analyses need.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    program: Term<Program>,
    cpu_architecture: String,
    stack_pointer_register: Resolution<Register>,
    register_properties: Vec<RegisterProperties>,
    register_calling_convention: Vec<RegisterConvention>,
}

impl Project {
    pub fn new(
        program: Term<Program>,
        cpu_architecture: String,
        stack_pointer_register: Resolution<Register>,
        register_properties: Vec<RegisterProperties>,
        register_calling_convention: Vec<RegisterConvention>,
    ) -> Project {
        Project {
            program,
            cpu_architecture,
            stack_pointer_register,
            register_properties,
            register_calling_convention,
        }
    }

    pub fn program(&self) -> &Term<Program> {
        &self.program
    }

    pub fn cpu_architecture(&self) -> &str {
        &self.cpu_architecture
    }

    pub fn stack_pointer_register(&self) -> &Resolution<Register> {
        &self.stack_pointer_register
    }

    pub fn register_properties(&self) -> &[RegisterProperties] {
        &self.register_properties
    }

    pub fn register_calling_convention(&self) -> &[RegisterConvention] {
        &self.register_calling_convention
    }
}
