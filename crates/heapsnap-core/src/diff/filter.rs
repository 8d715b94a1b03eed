use crate::types::TypeDescriptor;

/// Decides which types take part in a diff
pub trait TypeFilter {
    fn accepts(&self, ty: &TypeDescriptor) -> bool;
}

impl<F> TypeFilter for F
where
    F: Fn(&TypeDescriptor) -> bool,
{
    fn accepts(&self, ty: &TypeDescriptor) -> bool {
        self(ty)
    }
}

/// Filter on the assembly (module) that declares a type.
///
/// An empty include list admits every assembly; the exclude list always wins.
/// Names compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl AssemblyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, assembly: impl Into<String>) -> Self {
        self.include.push(assembly.into());
        self
    }

    pub fn exclude(mut self, assembly: impl Into<String>) -> Self {
        self.exclude.push(assembly.into());
        self
    }

    pub fn excluding<I, S>(assemblies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: Vec::new(),
            exclude: assemblies.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

impl TypeFilter for AssemblyFilter {
    fn accepts(&self, ty: &TypeDescriptor) -> bool {
        let assembly = ty.assembly();
        let matches = |name: &String| name.eq_ignore_ascii_case(assembly);

        if self.exclude.iter().any(matches) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(matches)
    }
}
