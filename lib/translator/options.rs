use std::default;

/// Various options that can be passed to the translator. Options will change
/// the behavior of the translator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Options {
    unsupported_are_placeholders: bool,
    static_hints: bool,
}

impl Options {
    /// Create a new set of Options with the default settings.
    pub fn new() -> Options {
        Options::default()
    }

    /// Set the value of the, "Unsupported are placeholders," option.
    pub fn set_unsupported_are_placeholders(&mut self, unsupported_are_placeholders: bool) {
        self.unsupported_are_placeholders = unsupported_are_placeholders;
    }

    /// Whether the translator should throw an error for unsupported or
    /// malformed micro-operations, or translate them to a placeholder `Def`.
    ///
    /// Placeholders assign an `Expression::Unknown` to the output of the
    /// operation, so downstream analyses see that the output was clobbered.
    /// This is the default.
    pub fn unsupported_are_placeholders(&self) -> bool {
        self.unsupported_are_placeholders
    }

    pub fn set_static_hints(&mut self, static_hints: bool) {
        self.static_hints = static_hints;
    }

    /// Whether indirect jumps and calls carry a `StaticHint` when one is
    /// visible in their target expression. On by default.
    pub fn static_hints(&self) -> bool {
        self.static_hints
    }
}

impl default::Default for Options {
    fn default() -> Options {
        Options {
            unsupported_are_placeholders: true,
            static_hints: true,
        }
    }
}

/// Create your options with the builder pattern.
///
/// For more details on the options, see `translator::Options`
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Create a new builder for translator options.
    pub fn new() -> OptionsBuilder {
        OptionsBuilder {
            options: Options::default(),
        }
    }

    /// Set the, "Unsupported are placeholders," option. By default this is
    /// true.
    pub fn unsupported_are_placeholders(
        mut self,
        unsupported_are_placeholders: bool,
    ) -> OptionsBuilder {
        self.options.unsupported_are_placeholders = unsupported_are_placeholders;
        self
    }

    pub fn static_hints(mut self, static_hints: bool) -> OptionsBuilder {
        self.options.static_hints = static_hints;
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

impl default::Default for OptionsBuilder {
    fn default() -> OptionsBuilder {
        OptionsBuilder::new()
    }
}
