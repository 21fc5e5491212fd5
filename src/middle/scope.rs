use hashbrown::HashMap;
use strum::IntoEnumIterator;

use crate::{
    frontend::intern::InternedSymbol,
    index::{IndexVec, simple_index},
    middle::builtin::Builtin,
};

simple_index! {
    /// Index of a frame in a [`ScopeChain`]
    pub struct ScopeId;
}

/// What a name in scope refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding<T> {
    Builtin(Builtin),
    Value(T),
}

/// The name was already bound in the innermost frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyDeclared;

#[derive(Debug)]
struct Frame<B> {
    bindings: HashMap<InternedSymbol, B>,
    parent: Option<ScopeId>,
}

/// A chain of lexical scope frames. Frames live in an arena and link to their
/// parent by index; popping a frame only moves the cursor back to its parent.
#[derive(Debug)]
pub struct ScopeChain<B> {
    frames: IndexVec<ScopeId, Frame<B>>,
    current: ScopeId,
}

impl<B> ScopeChain<B> {
    /// Creates a chain holding only an empty root frame
    pub fn new() -> Self {
        let mut frames = IndexVec::new();
        let root = frames.push(Frame {
            bindings: HashMap::new(),
            parent: None,
        });

        Self {
            frames,
            current: root,
        }
    }

    pub fn is_at_root(&self) -> bool {
        self.frames[self.current].parent.is_none()
    }

    /// Creates a new block or function frame and enters it
    pub fn push_scope(&mut self) -> ScopeId {
        self.current = self.frames.push(Frame {
            bindings: HashMap::new(),
            parent: Some(self.current),
        });

        self.current
    }

    /// Leaves the innermost frame
    pub fn pop_scope(&mut self) {
        let Some(parent) = self.frames[self.current].parent else {
            panic!("Attempted to pop the root frame of a scope chain");
        };

        self.current = parent;
    }

    /// Binds `symbol` in the innermost frame. Shadowing a binding of an outer
    /// frame is allowed.
    pub fn declare(&mut self, symbol: InternedSymbol, binding: B) -> Result<(), AlreadyDeclared> {
        let bindings = &mut self.frames[self.current].bindings;

        if bindings.contains_key(&symbol) {
            return Err(AlreadyDeclared);
        }

        bindings.insert(symbol, binding);

        Ok(())
    }

    /// Looks `symbol` up from the innermost frame outwards
    pub fn resolve(&self, symbol: InternedSymbol) -> Option<&B> {
        let mut scope = Some(self.current);

        while let Some(id) = scope {
            let frame = &self.frames[id];

            if let Some(binding) = frame.bindings.get(&symbol) {
                return Some(binding);
            }

            scope = frame.parent;
        }

        None
    }
}

impl<T> ScopeChain<Binding<T>> {
    /// Creates a chain whose root frame binds every operator and intrinsic
    pub fn with_builtins() -> Self {
        let mut chain = Self::new();
        let root = &mut chain.frames[chain.current].bindings;

        for builtin in Builtin::iter() {
            root.insert(builtin.symbol(), Binding::Builtin(builtin));
        }

        chain
    }
}

impl<B> Default for ScopeChain<B> {
    fn default() -> Self {
        Self::new()
    }
}
