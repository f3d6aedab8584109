//! Shared internals used by both the resolver and the planner's explicit-stack search loops.

use std::rc::Rc;

/// A tiny persistent singly-linked list. Both the resolver's resolvent and the planner's task
/// queue are shared structure between a frame and every alternative continuation pushed back onto
/// the stack when a choice point is explored — an owned `Vec` would force a clone of the whole
/// remaining list on every rule or method tried.
pub enum PersistentList<T> {
  Nil,
  Cons(T, Rc<PersistentList<T>>),
}

impl<T: Clone> Clone for PersistentList<T> {
  fn clone(&self) -> Self {
    match self {
      PersistentList::Nil => PersistentList::Nil,
      PersistentList::Cons(head, tail) => PersistentList::Cons(head.clone(), tail.clone()),
    }
  }
}

impl<T: Clone> PersistentList<T> {
  pub fn from_vec(items: Vec<T>) -> Rc<Self> {
    let mut list = Rc::new(PersistentList::Nil);
    for item in items.into_iter().rev() {
      list = Rc::new(PersistentList::Cons(item, list));
    }
    list
  }

  pub fn split_first(list: &Rc<Self>) -> Option<(T, Rc<Self>)> {
    match list.as_ref() {
      PersistentList::Nil => None,
      PersistentList::Cons(head, tail) => Some((head.clone(), tail.clone())),
    }
  }

  pub fn prepend_vec(items: Vec<T>, tail: Rc<Self>) -> Rc<Self> {
    let mut list = tail;
    for item in items.into_iter().rev() {
      list = Rc::new(PersistentList::Cons(item, list));
    }
    list
  }
}
