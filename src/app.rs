//! Owns application state and re-renders it into a host container on every update.

use crate::{diff::Reconciler, error::ReconcileError, host::HostTree, vnode::VNode};
use core::fmt::{self, Debug, Formatter};
use tracing::{error, instrument, trace};

/// Application state with an explicit merge.
///
/// `Update` should enumerate exactly the fields an update may touch, for example as a `struct` of [`Option`]s.
pub trait State {
	type Update;

	fn merge(&mut self, update: Self::Update);
}

/// Renders `S` into `container` through `render`, reconciling exactly once per [`RenderLoop::update`].
///
/// The loop keeps the last reconciled tree and diffs the next render against it.
/// Before the first pass there is no previous tree, so everything is created.
///
/// On a [`MemoryHost`](`crate::memory::MemoryHost`), replaced nodes stay in the arena and mutations accumulate in its journal,
/// so long-running loops should at least disable journaling.
///
/// # Re-entrancy
///
/// Event handlers that update the loop usually reach it through an `Rc<RefCell<RenderLoop<…>>>`.
/// Such a handler must not fire while a pass is running (which would panic on the `RefCell`),
/// so host events raised synchronously by DOM mutations (like `blur` on a removed, focused input)
/// should be deferred by the handler.
pub struct RenderLoop<S, H, R>
where
	S: State,
	H: HostTree,
	R: FnMut(&S) -> VNode,
{
	host: H,
	container: H::Node,
	state: S,
	render: R,
	previous: Option<VNode>,
	reconciler: Reconciler,
}

impl<S, H, R> Debug for RenderLoop<S, H, R>
where
	S: State + Debug,
	H: HostTree + Debug,
	R: FnMut(&S) -> VNode,
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderLoop")
			.field("host", &self.host)
			.field("container", &self.container)
			.field("state", &self.state)
			.field("previous", &self.previous)
			.field("reconciler", &self.reconciler)
			.finish_non_exhaustive()
	}
}

impl<S, H, R> RenderLoop<S, H, R>
where
	S: State,
	H: HostTree,
	R: FnMut(&S) -> VNode,
{
	/// The rendered tree will be the first child of `container`.
	pub fn new(host: H, container: H::Node, state: S, render: R) -> Self {
		Self {
			host,
			container,
			state,
			render,
			previous: None,
			reconciler: Reconciler::new(),
		}
	}

	#[must_use]
	pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
		self.reconciler = reconciler;
		self
	}

	/// Adopts `previous` as what `container`'s first child currently shows,
	/// for example a tree [loaded](`crate::load`) from server-rendered markup.
	#[must_use]
	pub fn with_previous(mut self, previous: VNode) -> Self {
		self.previous = Some(previous);
		self
	}

	/// Renders the initial state.
	///
	/// # Errors
	///
	/// Iff the pass fails. See [`RenderLoop::update`].
	pub fn mount(&mut self) -> Result<(), ReconcileError> {
		self.render()
	}

	/// Merges `update` into the state, then renders and reconciles once.
	///
	/// # Errors
	///
	/// Iff the pass fails. The host tree may then be partially patched,
	/// and the previous tree is kept as it was.
	pub fn update(&mut self, update: S::Update) -> Result<(), ReconcileError> {
		self.state.merge(update);
		self.render()
	}

	/// Re-renders the current state.
	///
	/// # Errors
	///
	/// Iff the pass fails. See [`RenderLoop::update`].
	#[instrument(skip(self))]
	pub fn render(&mut self) -> Result<(), ReconcileError> {
		let next = (self.render)(&self.state);
		if let Err(error) = self.reconciler.reconcile(&mut self.host, &self.container, Some(&next), self.previous.as_ref(), 0) {
			error!("Reconciliation failed: {}", error);
			return Err(error);
		}
		self.host.settle(&self.container);
		trace!("Retaining rendered tree.");
		self.previous = Some(next);
		Ok(())
	}

	pub fn state(&self) -> &S {
		&self.state
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	/// Mutating the host below the container desynchronizes it from the retained tree.
	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	pub fn container(&self) -> &H::Node {
		&self.container
	}

	/// The last successfully reconciled tree.
	pub fn previous(&self) -> Option<&VNode> {
		self.previous.as_ref()
	}

	/// Dismantles the loop, returning the host and state.
	pub fn into_parts(self) -> (H, S) {
		(self.host, self.state)
	}
}
