//! Prototype demo: shallow versus deep duplication.
//!
//! A component owns a shared list of objects and an entity whose `parent` points back
//! at the component. The demo mutates copies and originals and reports what each kind
//! of copy shares.
//!
//! Run with: `cargo run --example prototype`

use creational::{duplicate_node, impl_duplicate, shared, CopyMode, Duplicate, Memo, Shared};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug)]
enum Object {
    Int(i64),
    Set(Shared<BTreeSet<i64>>),
    List(Shared<Vec<i64>>),
    Text(String),
}

impl Duplicate for Object {
    fn shallow_duplicate(&self) -> Self {
        match self {
            Object::Int(n) => Object::Int(*n),
            Object::Set(set) => Object::Set(set.shallow_duplicate()),
            Object::List(list) => Object::List(list.shallow_duplicate()),
            Object::Text(text) => Object::Text(text.clone()),
        }
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        match self {
            Object::Int(n) => Object::Int(*n),
            Object::Set(set) => Object::Set(set.deep_duplicate(memo)),
            Object::List(list) => Object::List(list.deep_duplicate(memo)),
            Object::Text(text) => Object::Text(text.clone()),
        }
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        match self {
            Object::Set(set) => set.mark_reachable(memo),
            Object::List(list) => list.mark_reachable(memo),
            Object::Int(_) | Object::Text(_) => {}
        }
    }
}

struct SelfReferencingEntity {
    parent: Weak<RefCell<SomeComponent>>,
}

impl_duplicate!(SelfReferencingEntity { parent });

struct SomeComponent {
    some_int: i32,
    some_list_of_objects: Shared<Vec<Object>>,
    some_circular_ref: Shared<SelfReferencingEntity>,
}

impl_duplicate!(SomeComponent {
    some_int,
    some_list_of_objects,
    some_circular_ref,
});

fn last_is(component: &Shared<SomeComponent>, expected: &str) -> bool {
    matches!(
        component.borrow().some_list_of_objects.borrow().last(),
        Some(Object::Text(text)) if text == expected
    )
}

fn set_contains(component: &Shared<SomeComponent>, value: i64) -> bool {
    component
        .borrow()
        .some_list_of_objects
        .borrow()
        .iter()
        .any(|object| matches!(object, Object::Set(set) if set.borrow().contains(&value)))
}

fn insert_into_set(component: &Shared<SomeComponent>, value: i64) {
    for object in component.borrow().some_list_of_objects.borrow().iter() {
        if let Object::Set(set) = object {
            set.borrow_mut().insert(value);
        }
    }
}

fn push_text(component: &Shared<SomeComponent>, text: &str) {
    component
        .borrow()
        .some_list_of_objects
        .borrow_mut()
        .push(Object::Text(text.to_string()));
}

fn parent_of(component: &Shared<SomeComponent>) -> Option<Shared<SomeComponent>> {
    component.borrow().some_circular_ref.borrow().parent.upgrade()
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    let list_of_objects = shared(vec![
        Object::Int(1),
        Object::Set(shared([1, 2, 3].into_iter().collect())),
        Object::List(shared(vec![1, 2, 3])),
    ]);
    let circular_ref = shared(SelfReferencingEntity {
        parent: Weak::new(),
    });
    let component = shared(SomeComponent {
        some_int: 23,
        some_list_of_objects: list_of_objects,
        some_circular_ref: circular_ref.clone(),
    });
    circular_ref.borrow_mut().parent = Rc::downgrade(&component);

    let shallow_copied_component = duplicate_node(&component, CopyMode::Shallow, None);

    push_text(&shallow_copied_component, "another object");
    if last_is(&component, "another object") {
        println!(
            "Adding elements to `shallow_copied_component`'s some_list_of_objects adds it to `component`'s some_list_of_objects."
        );
    } else {
        println!(
            "Adding elements to `shallow_copied_component`'s some_list_of_objects doesn't add it to `component`'s some_list_of_objects."
        );
    }

    insert_into_set(&component, 4);
    if set_contains(&shallow_copied_component, 4) {
        println!(
            "Changing objects in the `component`'s some_list_of_objects changes that object in `shallow_copied_component`'s some_list_of_objects."
        );
    } else {
        println!(
            "Changing objects in the `component`'s some_list_of_objects doesn't change that object in `shallow_copied_component`'s some_list_of_objects."
        );
    }

    let deep_copied_component = duplicate_node(&component, CopyMode::Deep, None);

    push_text(&deep_copied_component, "one more object");
    if last_is(&component, "one more object") {
        println!(
            "Adding elements to `deep_copied_component`'s some_list_of_objects adds it to `component`'s some_list_of_objects."
        );
    } else {
        println!(
            "Adding elements to `deep_copied_component`'s some_list_of_objects doesn't add it to `component`'s some_list_of_objects."
        );
    }

    insert_into_set(&component, 10);
    if set_contains(&deep_copied_component, 10) {
        println!(
            "Changing objects in the `component`'s some_list_of_objects changes that object in `deep_copied_component`'s some_list_of_objects."
        );
    } else {
        println!(
            "Changing objects in the `component`'s some_list_of_objects doesn't change that object in `deep_copied_component`'s some_list_of_objects."
        );
    }

    let Some(parent) = parent_of(&deep_copied_component) else {
        eprintln!("deep copy lost its parent reference");
        return;
    };
    let Some(grandparent) = parent_of(&parent) else {
        eprintln!("deep copy lost its parent reference");
        return;
    };

    println!(
        "id(deep_copied_component.some_circular_ref.parent): {:p}",
        Rc::as_ptr(&parent)
    );
    println!(
        "id(deep_copied_component.some_circular_ref.parent.some_circular_ref.parent): {:p}",
        Rc::as_ptr(&grandparent)
    );
    println!(
        "^^ This shows that deepcopied objects contain same reference, they are not cloned repeatedly."
    );
    println!(
        "deep_copied_component.some_int = {}",
        deep_copied_component.borrow().some_int
    );
}
