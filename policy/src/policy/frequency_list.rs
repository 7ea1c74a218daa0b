use std::fmt;

use crate::error::{try_alloc, PolicyError};
use crate::policy::{link, NIL};

#[derive(Debug, Clone, Copy)]
struct Element {
  prev: u32,
  next: u32,
  key: u64,
}

impl Element {
  const UNLINKED: Element = Element {
    prev: NIL,
    next: NIL,
    key: 0,
  };
}

/// A fixed-capacity list of element indices kept ascending by a `u64` key
/// from head to tail.
///
/// Elements are addressed by index in `0..capacity` and live in a single
/// arena; links are indices into that arena. The head is always the element
/// with the lowest key. Equal keys keep insertion order.
pub struct FrequencyList {
  elems: Box<[Element]>,
  head: u32,
  tail: u32,
  len: usize,
}

impl fmt::Debug for FrequencyList {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FrequencyList")
      .field("capacity", &self.elems.len())
      .field("len", &self.len)
      .field("head", &link(self.head))
      .field("tail", &link(self.tail))
      .finish()
  }
}

impl FrequencyList {
  /// Allocates a list able to hold `capacity` elements. All elements start
  /// unlinked with key 0.
  pub fn create(capacity: usize) -> Result<Self, PolicyError> {
    if capacity == 0 || capacity >= NIL as usize {
      return Err(PolicyError::InvalidCapacity(capacity));
    }
    let mut elems = try_alloc("frequency list elements", capacity)?;
    elems.resize(capacity, Element::UNLINKED);
    Ok(Self {
      elems: elems.into_boxed_slice(),
      head: NIL,
      tail: NIL,
      len: 0,
    })
  }

  pub fn capacity(&self) -> usize {
    self.elems.len()
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Whether `index` is currently linked into the list.
  pub fn contains(&self, index: usize) -> bool {
    match self.elems.get(index) {
      Some(e) => {
        let i = index as u32;
        e.prev != NIL || e.next != NIL || self.head == i || self.tail == i
      }
      None => false,
    }
  }

  /// Last key recorded for `index`, linked or not.
  pub fn key(&self, index: usize) -> Option<u64> {
    self.elems.get(index).map(|e| e.key)
  }

  /// Adds `index` with `key`, keeping the list ascending.
  ///
  /// The element is appended at the tail, then walked toward the head past
  /// every predecessor with a strictly greater key. The walk stops at the
  /// first predecessor whose key is not greater, at the head, or after
  /// `len - 1` comparisons, so the cost is the distance moved.
  ///
  /// Inserting an index that is already linked repositions it under the new key.
  pub fn insert(&mut self, index: usize, key: u64) -> Result<(), PolicyError> {
    PolicyError::check_index(index, self.elems.len())?;
    if self.contains(index) {
      self.remove(index)?;
    }

    let i = index as u32;
    self.elems[index] = Element {
      prev: self.tail,
      next: NIL,
      key,
    };
    match link(self.tail) {
      Some(t) => self.elems[t].next = i,
      None => {
        debug_assert_eq!(self.head, NIL, "empty list must have no head");
        self.head = i;
      }
    }
    self.tail = i;
    self.len += 1;

    let mut dest = NIL;
    let mut cursor = self.elems[index].prev;
    let mut remaining = self.len - 1;
    while let Some(c) = link(cursor) {
      if remaining == 0 || key >= self.elems[c].key {
        break;
      }
      dest = cursor;
      cursor = self.elems[c].prev;
      remaining -= 1;
    }

    if let Some(d) = link(dest) {
      self.unlink(index);
      self.link_before(index, d);
    }
    Ok(())
  }

  /// Unlinks `index`. Removing an element that is not linked is a no-op.
  pub fn remove(&mut self, index: usize) -> Result<(), PolicyError> {
    PolicyError::check_index(index, self.elems.len())?;
    if !self.contains(index) {
      return Ok(());
    }
    self.unlink(index);

    debug_assert!(self.len > 0, "linked element in a list of size zero");
    if self.len == 0 {
      tracing::warn!(index, "frequency list size underflow on remove; clamping");
    }
    self.len = self.len.saturating_sub(1);
    Ok(())
  }

  /// Bumps the key of `index` by one and repositions it.
  pub fn touch(&mut self, index: usize) -> Result<(), PolicyError> {
    PolicyError::check_index(index, self.elems.len())?;
    let key = self.elems[index].key;
    self.remove(index)?;
    self.insert(index, key.saturating_add(1))
  }

  /// The least-used element and its key, without removing it.
  pub fn peek_head(&self) -> Option<(usize, u64)> {
    link(self.head).map(|h| (h, self.elems[h].key))
  }

  /// Removes and returns the least-used element and its key.
  pub fn pop_head(&mut self) -> Option<(usize, u64)> {
    let (index, key) = self.peek_head()?;
    self.unlink(index);
    self.len = self.len.saturating_sub(1);
    Some((index, key))
  }

  /// Unlinks every element and zeroes every key.
  pub fn clear(&mut self) {
    self.elems.fill(Element::UNLINKED);
    self.head = NIL;
    self.tail = NIL;
    self.len = 0;
  }

  /// Iterates `(index, key)` pairs from head to tail.
  pub fn iter(&self) -> Iter<'_> {
    Iter {
      list: self,
      cursor: self.head,
      remaining: self.len,
    }
  }

  /// Verifies the doubly-linked structure, the element count and ascending keys.
  pub fn check_integrity(&self) -> Result<(), PolicyError> {
    if (self.head == NIL) != (self.tail == NIL) || (self.head == NIL) != (self.len == 0) {
      return Err(PolicyError::Corrupted(format!(
        "head {:?}, tail {:?} and len {} disagree",
        link(self.head),
        link(self.tail),
        self.len
      )));
    }

    let mut prev = NIL;
    let mut cursor = self.head;
    let mut seen = 0usize;
    while let Some(c) = link(cursor) {
      let e = self.elems.get(c).ok_or_else(|| {
        PolicyError::Corrupted(format!("link to {c} is outside capacity {}", self.elems.len()))
      })?;
      if e.prev != prev {
        return Err(PolicyError::Corrupted(format!(
          "element {c} has prev {:?}, expected {:?}",
          link(e.prev),
          link(prev)
        )));
      }
      if let Some(p) = link(prev) {
        if self.elems[p].key > e.key {
          return Err(PolicyError::Corrupted(format!(
            "key {} of element {p} exceeds key {} of its successor {c}",
            self.elems[p].key, e.key
          )));
        }
      }
      seen += 1;
      if seen > self.len {
        return Err(PolicyError::Corrupted(format!(
          "walk exceeded len {} (cycle?)",
          self.len
        )));
      }
      prev = cursor;
      cursor = e.next;
    }

    if prev != self.tail {
      return Err(PolicyError::Corrupted(format!(
        "walk ended at {:?} but tail is {:?}",
        link(prev),
        link(self.tail)
      )));
    }
    if seen != self.len {
      return Err(PolicyError::Corrupted(format!(
        "walked {seen} elements but len is {}",
        self.len
      )));
    }
    Ok(())
  }

  // Unlinks a linked element and clears its links. Does not touch `len`.
  fn unlink(&mut self, index: usize) {
    let Element { prev, next, .. } = self.elems[index];

    match link(prev) {
      Some(p) => self.elems[p].next = next,
      None => self.head = next,
    }
    match link(next) {
      Some(n) => self.elems[n].prev = prev,
      None => self.tail = prev,
    }

    self.elems[index].prev = NIL;
    self.elems[index].next = NIL;
  }

  // Splices an unlinked element in front of the linked element `dest`.
  fn link_before(&mut self, index: usize, dest: usize) {
    let i = index as u32;
    let prev = self.elems[dest].prev;

    self.elems[index].prev = prev;
    self.elems[index].next = dest as u32;
    self.elems[dest].prev = i;
    match link(prev) {
      Some(p) => self.elems[p].next = i,
      None => self.head = i,
    }
  }
}

/// Head-to-tail iterator over a [`FrequencyList`].
#[derive(Debug)]
pub struct Iter<'a> {
  list: &'a FrequencyList,
  cursor: u32,
  remaining: usize,
}

impl Iterator for Iter<'_> {
  type Item = (usize, u64);

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }
    let c = link(self.cursor)?;
    let e = &self.list.elems[c];
    self.cursor = e.next;
    self.remaining -= 1;
    Some((c, e.key))
  }
}
