//! Object navigation for dotted paths (`tile.Bounds.Width`).
//!
//! Runtime reflection does not exist here, so the host registers, per object
//! type, a map from property name to extractor and from method name to
//! invoker. The accessor kernel is then a loop of resolver lookups: a field
//! wins over a method, method arguments come from the containing stage's
//! right-hand value, and panics inside caller-supplied closures are caught
//! and converted to accessor errors naming the dotted path.

use std::any::{Any, TypeId};
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};

use crate::error::eval::{EvalError, FunctionError};
use crate::evaluator::Evaluator;
use crate::lexer::token::AccessorSegments;
use crate::value::{ObjectHandle, Value};

type FieldFn = Arc<dyn Fn(&dyn Any) -> Value + Send + Sync>;
type MethodFn = Arc<dyn Fn(&dyn Any, &[Value]) -> Result<Value, FunctionError> + Send + Sync>;

/// Field extractors and method invokers for one object type.
pub struct TypeResolver {
    fields: FxHashMap<&'static str, FieldFn>,
    methods: FxHashMap<&'static str, MethodFn>,
}

/// Typed construction surface for a [`TypeResolver`]; the stored closures
/// downcast back to `T` when invoked.
pub struct ResolverBuilder<T> {
    fields: FxHashMap<&'static str, FieldFn>,
    methods: FxHashMap<&'static str, MethodFn>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Any> ResolverBuilder<T> {
    fn new() -> Self {
        ResolverBuilder {
            fields: FxHashMap::default(),
            methods: FxHashMap::default(),
            _marker: PhantomData,
        }
    }

    pub fn field(
        mut self,
        name: &'static str,
        extract: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(
            name,
            Arc::new(move |object: &dyn Any| {
                let object = object
                    .downcast_ref::<T>()
                    .expect("resolver invoked with a mismatched object type");
                extract(object)
            }),
        );
        self
    }

    pub fn method(
        mut self,
        name: &'static str,
        invoke: impl Fn(&T, &[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    ) -> Self {
        self.methods.insert(
            name,
            Arc::new(move |object: &dyn Any, args: &[Value]| {
                let object = object
                    .downcast_ref::<T>()
                    .expect("resolver invoked with a mismatched object type");
                invoke(object, args)
            }),
        );
        self
    }

    fn finish(self) -> TypeResolver {
        TypeResolver {
            fields: self.fields,
            methods: self.methods,
        }
    }
}

/// Registry of [`TypeResolver`]s keyed by the concrete type of the object
/// behind an [`ObjectHandle`].
#[derive(Default)]
pub struct ObjectResolvers {
    types: FxHashMap<TypeId, TypeResolver>,
}

impl ObjectResolvers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Any>(
        &mut self,
        build: impl FnOnce(ResolverBuilder<T>) -> ResolverBuilder<T>,
    ) {
        self.types
            .insert(TypeId::of::<T>(), build(ResolverBuilder::new()).finish());
    }

    /// Builder-style [`ObjectResolvers::register`].
    pub fn with<T: Any>(
        mut self,
        build: impl FnOnce(ResolverBuilder<T>) -> ResolverBuilder<T>,
    ) -> Self {
        self.register(build);
        self
    }

    fn resolver_for(&self, object: &ObjectHandle) -> Option<&TypeResolver> {
        self.types.get(&(**object).type_id())
    }
}

impl Debug for ObjectResolvers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectResolvers({} types)", self.types.len())
    }
}

fn dotted(segments: &AccessorSegments) -> String {
    segments.iter().join(".")
}

fn catch_panic<T>(segments: &AccessorSegments, f: impl FnOnce() -> T) -> Result<T, EvalError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "panic during accessor evaluation".to_string()
        };
        EvalError::AccessorPanic {
            path: dotted(segments),
            message,
        }
    })
}

/// Walks a dotted path: the root resolves through the parameter source, each
/// following segment through the registered resolver of the current object.
pub(crate) fn evaluate_accessor(
    segments: &AccessorSegments,
    right: Value,
    ev: &Evaluator<'_>,
) -> Result<Value, EvalError> {
    let mut current = ev.parameters().get(&segments[0])?;
    let args: SmallVec<[Value; 4]> = match right {
        Value::None => SmallVec::new(),
        Value::List(values) => values.into_iter().collect(),
        value => smallvec![value],
    };

    for i in 1..segments.len() {
        let segment = &segments[i];
        let prior = &segments[i - 1];

        let handle = match current {
            Value::Object(handle) => handle,
            _ => {
                return Err(EvalError::NotAStruct {
                    segment: segment.clone(),
                    prior: prior.clone(),
                });
            }
        };
        let resolver =
            ev.resolvers()
                .resolver_for(&handle)
                .ok_or_else(|| EvalError::NoResolver {
                    path: dotted(segments),
                })?;

        if let Some(extract) = resolver.fields.get(segment.as_str()) {
            current = catch_panic(segments, || extract(handle.as_ref()))?;
            continue;
        }

        match resolver.methods.get(segment.as_str()) {
            Some(invoke) => {
                current = catch_panic(segments, || invoke(handle.as_ref(), &args))?.map_err(
                    |err| EvalError::MethodCall {
                        path: dotted(segments),
                        message: err.into_message(),
                    },
                )?;
            }
            None => {
                return Err(EvalError::NoSuchMember {
                    segment: segment.clone(),
                    prior: prior.clone(),
                });
            }
        }
    }

    Ok(current)
}
