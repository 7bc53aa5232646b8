//! Filters deciding which realized objects make it into the output

use super::image::ImageRef;
use crate::platform::Object;
use std::collections::HashSet;
use std::rc::Rc;

/// Remembers which shared images were already realized
#[derive(Debug, Default)]
pub struct AcceptFirst {
    seen: HashSet<*const ImageRef>,
}

impl AcceptFirst {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time a given image is offered
    pub fn accept(&mut self, image: &Rc<ImageRef>) -> bool {
        self.seen.insert(Rc::as_ptr(image))
    }
}

/// Decides whether an object is kept
pub trait Acceptor {
    fn accept(&mut self, object: &Object) -> bool;
}

/// Keeps the first object of each kind and name
#[derive(Debug, Default)]
pub struct AcceptUnique {
    seen: HashSet<(String, String)>,
}

impl AcceptUnique {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Acceptor for AcceptUnique {
    fn accept(&mut self, object: &Object) -> bool {
        self.seen
            .insert((object.kind().to_string(), object.name().to_string()))
    }
}

/// Keeps only objects that do not exist on a server yet
#[derive(Debug, Default)]
pub struct AcceptNew;

impl Acceptor for AcceptNew {
    fn accept(&mut self, object: &Object) -> bool {
        object.metadata().resource_version.is_none()
    }
}

/// Acceptors applied in sequence; an object is kept when all accept it
#[derive(Default)]
pub struct Acceptors(Vec<Box<dyn Acceptor>>);

impl Acceptors {
    /// Uniqueness followed by newness
    pub fn standard() -> Self {
        Self(vec![Box::new(AcceptUnique::new()), Box::new(AcceptNew)])
    }

    /// Add an acceptor to the end of the chain
    pub fn push(&mut self, acceptor: impl Acceptor + 'static) {
        self.0.push(Box::new(acceptor));
    }
}

impl Acceptor for Acceptors {
    fn accept(&mut self, object: &Object) -> bool {
        self.0.iter_mut().all(|acceptor| acceptor.accept(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ImageStream, Service};
    use std::collections::BTreeMap;

    #[test]
    fn test_accept_first_by_identity() {
        let mut accept = AcceptFirst::new();
        let image = Rc::new(ImageRef::output("web"));
        let same = Rc::clone(&image);
        let equal = Rc::new(ImageRef::output("web"));

        assert!(accept.accept(&image));
        assert!(!accept.accept(&same));
        assert!(accept.accept(&equal));
    }

    #[test]
    fn test_accept_unique_by_kind_and_name() {
        let mut unique = AcceptUnique::new();
        assert!(unique.accept(&ImageStream::new("web").into()));
        assert!(!unique.accept(&ImageStream::new("web").into()));
        assert!(unique.accept(&Service::new("web", BTreeMap::new(), Vec::new()).into()));
    }

    #[test]
    fn test_accept_new_rejects_existing_objects() {
        let mut stream = ImageStream::new("web");
        assert!(AcceptNew.accept(&stream.clone().into()));
        stream.metadata.resource_version = Some("1".to_string());
        assert!(!AcceptNew.accept(&stream.into()));
    }

    #[test]
    fn test_acceptors_chain() {
        let mut acceptors = Acceptors::standard();
        assert!(acceptors.accept(&ImageStream::new("a").into()));
        assert!(!acceptors.accept(&ImageStream::new("a").into()));
    }
}
