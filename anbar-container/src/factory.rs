//! Factory introspection.
//!
//! A factory is any `Fn(Arc<A1>, .., Arc<An>) -> T` (up to eight
//! parameters). Each parameter is a dependency, the return type is the
//! component. Fallible factories return `Result<T, E>` and are registered
//! through [`FactoryHandle::fallible`].

use std::any::type_name;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use anbar_support::rendering::shorten_type_name;

use crate::error::ArgError;
use crate::introspect::{Args, BoxError, CallFn, Instance, ShareFn, share};
use crate::key::ComponentId;

/// A callable the container can invoke with resolved dependencies.
///
/// Implemented for closures and functions taking `Arc<_>` parameters.
/// `Params` is the tuple of parameter types; it keeps the arity impls apart.
pub trait Constructor<Params>: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    /// Dependency ids in parameter order.
    fn params() -> Vec<ComponentId>;

    fn construct(&self, args: &mut Args) -> Result<Self::Output, ArgError>;
}

macro_rules! impl_constructor {
    ($($param:ident),*) => {
        impl<F, T, $($param,)*> Constructor<($(Arc<$param>,)*)> for F
        where
            F: Fn($(Arc<$param>),*) -> T + Send + Sync + 'static,
            T: Send + Sync + 'static,
            $($param: ?Sized + 'static,)*
        {
            type Output = T;

            fn params() -> Vec<ComponentId> {
                vec![$(ComponentId::of::<$param>()),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn construct(&self, args: &mut Args) -> Result<T, ArgError> {
                $(let $param = args.shared::<$param>()?;)*
                Ok((self)($($param),*))
            }
        }
    };
}

impl_constructor!();
impl_constructor!(A1);
impl_constructor!(A1, A2);
impl_constructor!(A1, A2, A3);
impl_constructor!(A1, A2, A3, A4);
impl_constructor!(A1, A2, A3, A4, A5);
impl_constructor!(A1, A2, A3, A4, A5, A6);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7, A8);

/// One return value of a factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnInfo {
    pub id: ComponentId,
    pub name: String,
    /// `true` when the type is an error type.
    pub error_like: bool,
}

impl ReturnInfo {
    /// `name` is the bare type name: every `Box<..>` level is peeled off,
    /// matching what derived components report.
    pub fn value<T: ?Sized + 'static>() -> Self {
        Self {
            id: ComponentId::of::<T>(),
            name: bare_name(&shorten_type_name(type_name::<T>())),
            error_like: false,
        }
    }

    pub fn error<E: Error + 'static>() -> Self {
        Self {
            error_like: true,
            ..Self::value::<E>()
        }
    }
}

fn bare_name(mut name: &str) -> String {
    while let Some(inner) = name.strip_prefix("Box<").and_then(|n| n.strip_suffix('>')) {
        name = inner;
    }
    name.to_string()
}

/// Erased description of a factory, as the registry sees it.
#[derive(Clone)]
pub struct FactoryHandle {
    pub params: Vec<ComponentId>,
    pub returns: Vec<ReturnInfo>,
    pub share: ShareFn,
    pub call: CallFn,
}

impl FactoryHandle {
    /// A factory that always produces its component.
    pub fn infallible<F, P>(factory: F) -> Self
    where
        F: Constructor<P>,
    {
        let call: CallFn = Arc::new(move |args: &mut Args| {
            let output = factory.construct(args)?;
            Ok(Ok(Arc::new(output) as Instance))
        });
        Self {
            params: F::params(),
            returns: vec![ReturnInfo::value::<F::Output>()],
            share: share::<F::Output>,
            call,
        }
    }

    /// A factory returning `Result<T, E>`. An `Err` surfaces from resolve as
    /// [`ResolveError::Factory`](crate::error::ResolveError::Factory).
    pub fn fallible<F, P, T, E>(factory: F) -> Self
    where
        F: Constructor<P, Output = Result<T, E>>,
        T: Send + Sync + 'static,
        E: Error + Send + Sync + 'static,
    {
        let call: CallFn = Arc::new(move |args: &mut Args| {
            let output = factory.construct(args)?;
            Ok(output
                .map(|value| Arc::new(value) as Instance)
                .map_err(|err| Box::new(err) as BoxError))
        });
        Self {
            params: F::params(),
            returns: vec![ReturnInfo::value::<T>(), ReturnInfo::error::<E>()],
            share: share::<T>,
            call,
        }
    }
}

impl fmt::Debug for FactoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryHandle")
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}
