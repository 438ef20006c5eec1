// Copyright (c) 2025 vivo Mobile Communication Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//       http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The thread runtime: control blocks, the global registry, the machine
//! context switch and the lifecycle operations.
//!
//! Everything here runs with interrupts masked (see [`crate::irq`]); exactly
//! one thread is running at any instant and a public entry performs at most
//! one context switch before restoring the caller's mask state.

use crate::{
    config::{MAX_THREADS, MIN_STACK},
    error::{code, Error},
    irq::{self, IrqGuard},
    scheduler::{
        self,
        wait_queue::{OwnerSlot, WaitQueue},
    },
    stack::Stack,
    startup,
};
use core::cell::Cell;
use core::ptr::NonNull;
use green_arch::arch::{Arch, Context};

/// A thread identifier. Valid identifiers are in `[0, MAX_THREADS)`; the
/// bootstrap thread is always 0. Negative values are reserved for control
/// codes and errors.
pub type Tid = i32;

/// Yield target meaning "any runnable thread the scheduler picks".
pub const ANY: Tid = -2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Running,
    Runnable,
    Blocked,
    Zombie,
}

/// Thread control block. Owned by the registry from creation until the last
/// reaper releases the identifier; the execution stack is owned here and
/// freed exactly once, by whichever context switch first observes the thread
/// as a zombie from another stack.
pub(crate) struct Thread {
    pub(crate) id: Tid,
    pub(crate) state: Cell<State>,
    pub(crate) is_killed: Cell<bool>,

    // Wait-queue linkage; a thread is in at most one queue at a time.
    pub(crate) in_queue: Cell<bool>,
    pub(crate) qnext: Cell<Option<NonNull<Thread>>>,
    pub(crate) qprev: Cell<Option<NonNull<Thread>>>,

    context: Context,
    stack: Option<Stack>,
    entry: Option<Box<dyn FnOnce() -> i32>>,

    /// Threads that joined on this one.
    pub(crate) join_queue: WaitQueue,
    /// The queue this thread is blocked in, if any. Non-empty iff Blocked.
    pub(crate) waiting_on: Cell<Option<NonNull<WaitQueue>>>,

    pub(crate) exit_code: Cell<i32>,
    /// Joiners woken at exit that still have to observe the exit code.
    reapers: Cell<usize>,
    /// Set when no joiner was queued at exit; grants exactly one later
    /// joiner the right to observe and reap.
    late_waiter_succeed: Cell<bool>,

    /// Owner-slot target for the join queue: always points back at this
    /// record, so joiners are seen as waiting on the join target.
    self_slot: OwnerSlot,
}

impl Thread {
    pub(crate) fn bare(id: Tid) -> Box<Thread> {
        Box::new(Thread {
            id,
            state: Cell::new(State::Runnable),
            is_killed: Cell::new(false),
            in_queue: Cell::new(false),
            qnext: Cell::new(None),
            qprev: Cell::new(None),
            context: Arch::empty_context(),
            stack: None,
            entry: None,
            join_queue: WaitQueue::new(MAX_THREADS).expect("join queue"),
            waiting_on: Cell::new(None),
            exit_code: Cell::new(0),
            reapers: Cell::new(0),
            late_waiter_succeed: Cell::new(false),
            self_slot: Cell::new(None),
        })
    }

    fn link_join_owner(&mut self) {
        let me = NonNull::from(&mut *self);
        self.self_slot.set(Some(me));
        let slot = NonNull::from(&self.self_slot);
        self.join_queue.set_owner(Some(slot));
    }
}

static mut THREADS: [Option<NonNull<Thread>>; MAX_THREADS] = [None; MAX_THREADS];
static mut ID_FREE: [bool; MAX_THREADS] = [true; MAX_THREADS];
static mut CURRENT: Option<NonNull<Thread>> = None;
static mut PREVIOUS: Option<NonNull<Thread>> = None;

fn registry_slot(id: usize) -> &'static mut Option<NonNull<Thread>> {
    unsafe { &mut (*(&raw mut THREADS))[id] }
}

fn id_free(id: usize) -> &'static mut bool {
    unsafe { &mut (*(&raw mut ID_FREE))[id] }
}

pub(crate) fn current() -> NonNull<Thread> {
    unsafe { (*(&raw const CURRENT)).expect("threading not initialized") }
}

/// Identifier of the running thread.
pub fn current_id() -> Tid {
    unsafe { current().as_ref().id }
}

/// Like [`current_id`], but usable before the runtime is up (diagnostics).
pub fn try_current_id() -> Option<Tid> {
    unsafe { (*(&raw const CURRENT)).map(|t| t.as_ref().id) }
}

fn get(tid: Tid) -> Option<NonNull<Thread>> {
    *registry_slot(tid as usize)
}

fn alloc_id() -> Option<Tid> {
    // Smallest unused identifier wins, so ids are reused eagerly after reap.
    for id in 0..MAX_THREADS {
        let free = id_free(id);
        if *free {
            *free = false;
            return Some(id as Tid);
        }
    }
    None
}

/// Materialize the bootstrap thread (id 0) for the caller's own stack.
pub(crate) fn init() {
    unsafe {
        assert!(
            (*(&raw const CURRENT)).is_none(),
            "threading already initialized"
        );
    }
    for id in 0..MAX_THREADS {
        *registry_slot(id) = None;
        *id_free(id) = true;
    }
    // The bootstrap stack is not owned by the runtime; `stack` stays empty.
    let mut main_thread = Thread::bare(0);
    main_thread.state.set(State::Running);
    main_thread.link_join_owner();
    let nn = NonNull::from(Box::leak(main_thread));
    *id_free(0) = false;
    *registry_slot(0) = Some(nn);
    unsafe {
        *(&raw mut CURRENT) = Some(nn);
        *(&raw mut PREVIOUS) = None;
    }
}

/// Create a thread running `f` with the default stack.
///
/// The thread is runnable once this returns; it is not scheduled
/// immediately. The value returned by `f` becomes the exit code observed by
/// [`wait`].
pub fn spawn<F>(f: F) -> Result<Tid, Error>
where
    F: FnOnce() -> i32 + 'static,
{
    spawn_with_stack(f, MIN_STACK)
}

/// [`spawn`] with a chosen stack size; requests below the minimum are
/// rounded up. Fails with `NOMORE` when no identifier is free and
/// `NOMEMORY` when the stack cannot be allocated.
pub fn spawn_with_stack<F>(f: F, stack_size: usize) -> Result<Tid, Error>
where
    F: FnOnce() -> i32 + 'static,
{
    let _irq = IrqGuard::new();
    current(); // creation requires a started runtime

    let Some(id) = alloc_id() else {
        return Err(code::NOMORE);
    };
    let Some(stack) = Stack::alloc(stack_size.max(MIN_STACK)) else {
        *id_free(id as usize) = true;
        return Err(code::NOMEMORY);
    };

    let mut tcb = Thread::bare(id);
    tcb.entry = Some(Box::new(f));
    unsafe {
        Arch::init_thread_context(
            &mut tcb.context,
            stack.bottom_ptr(),
            stack.size(),
            trampoline,
        );
    }
    tcb.stack = Some(stack);
    tcb.link_join_owner();

    let nn = NonNull::from(Box::leak(tcb));
    *registry_slot(id as usize) = Some(nn);
    scheduler::enqueue(nn).expect("ready queue overflow");
    log::trace!("thread {} created", id);
    Ok(id)
}

/// Entry of every spawned thread. The switch that first runs a new thread
/// never returns through [`switch_to`], so the resume duties happen here:
/// reclaim the predecessor's stack if it exited, honor a kill delivered
/// before the first run, then reopen the mask and call the entry function.
/// The context starts masked (it was captured inside `spawn`'s critical
/// region), which keeps the reclaim inside a masked region like every other
/// allocator use.
extern "C" fn trampoline() {
    reap_previous();
    let me = current();
    if unsafe { me.as_ref() }.is_killed.get() {
        exit(code::KILLED.to_errno());
    }
    let entry = unsafe { (*me.as_ptr()).entry.take() }.expect("thread has no entry function");
    irq::on();
    let exit_code = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(entry)) {
        Ok(exit_code) => exit_code,
        // A panic must not unwind off the base of a thread stack.
        Err(_) => std::process::abort(),
    };
    exit(exit_code);
}

/// A thread cannot free the stack it is executing on; its successor does it
/// on the first switch that observes the zombie.
fn reap_previous() {
    let prev = unsafe { *(&raw const PREVIOUS) };
    if let Some(prev) = prev {
        let t = unsafe { &mut *prev.as_ptr() };
        if t.state.get() == State::Zombie {
            drop(t.stack.take());
        }
    }
}

/// Swap to `next`. Returns when some later switch resumes the calling
/// thread; the resume path reclaims the predecessor's stack and turns a
/// pending kill into an exit before letting the thread continue.
unsafe fn switch_to(next: NonNull<Thread>) {
    let prev = current();
    *(&raw mut PREVIOUS) = Some(prev);
    *(&raw mut CURRENT) = Some(next);
    next.as_ref().state.set(State::Running);
    Arch::context_switch(&mut (*prev.as_ptr()).context, &(*next.as_ptr()).context);

    reap_previous();
    let me = current();
    if me.as_ref().is_killed.get() {
        exit(code::KILLED.to_errno());
    }
}

/// Suspend the caller and run another thread.
///
/// `want` may be [`ANY`], the caller's own id (a no-op), or a concrete
/// target, which must exist and be runnable. Returns the identifier
/// switched to; `NONE` when the scheduler is empty, `INVALID` for a bad
/// target. Yielding to a blocked thread is `INVALID`, not a wakeup.
pub fn yield_to(want: Tid) -> Result<Tid, Error> {
    let _irq = IrqGuard::new();
    let me = current();
    let t = unsafe { me.as_ref() };

    if want == t.id {
        return Ok(want);
    }

    if want == ANY {
        let Some(next) = scheduler::dequeue() else {
            return Err(code::NONE);
        };
        let next_id = unsafe { next.as_ref() }.id;
        if t.state.get() != State::Blocked {
            t.state.set(State::Runnable);
            scheduler::enqueue(me).expect("ready queue overflow");
        }
        unsafe { switch_to(next) };
        return Ok(next_id);
    }

    if want < 0 || want as usize >= MAX_THREADS {
        return Err(code::INVALID);
    }
    let Some(target) = get(want) else {
        return Err(code::INVALID);
    };
    if unsafe { target.as_ref() }.state.get() != State::Runnable {
        return Err(code::INVALID);
    }
    let Some(target) = scheduler::remove(want) else {
        return Err(code::INVALID);
    };

    t.state.set(State::Runnable);
    scheduler::enqueue(me).expect("ready queue overflow");
    unsafe { switch_to(target) };
    Ok(want)
}

/// Terminate the calling thread.
///
/// Wakes every queued joiner and records how many must still observe the
/// exit code before the identifier can be reused. When no joiner was
/// queued, a single future joiner may still reap. If no other thread is
/// runnable the whole process exits with `exit_code`.
pub fn exit(exit_code: i32) -> ! {
    irq::off();
    let me = current();
    let t = unsafe { me.as_ref() };
    log::trace!("thread {} exits with {}", t.id, exit_code);

    t.exit_code.set(exit_code);
    t.state.set(State::Zombie);
    let woken = wakeup(&t.join_queue, true);
    t.reapers.set(woken);
    t.late_waiter_succeed.set(woken == 0);

    if let Some(next) = scheduler::dequeue() {
        unsafe { switch_to(next) };
        unreachable!("a zombie was scheduled again");
    }
    startup::terminate(exit_code)
}

/// Mark `tid` for termination.
///
/// A blocked target is lifted out of its wait queue and made runnable; in
/// every case the target discovers the flag at its next resume (or in the
/// trampoline, if it never ran) and exits with `KILLED`. Killing an
/// already-killed or exited-but-unreaped thread succeeds with no further
/// effect.
pub fn kill(tid: Tid) -> Result<Tid, Error> {
    let _irq = IrqGuard::new();
    if tid < 0 || tid as usize >= MAX_THREADS || tid == current_id() {
        return Err(code::INVALID);
    }
    let Some(victim) = get(tid) else {
        return Err(code::INVALID);
    };
    let t = unsafe { victim.as_ref() };

    if t.state.get() == State::Blocked {
        let queue = t.waiting_on.get().expect("blocked thread has no wait queue");
        unsafe { queue.as_ref() }.remove(tid);
        t.waiting_on.set(None);
        t.state.set(State::Runnable);
        scheduler::enqueue(victim).expect("ready queue overflow");
    }
    t.is_killed.set(true);
    log::trace!("thread {} killed", tid);
    Ok(tid)
}

/// Block until `tid` exits and return its exit code.
///
/// Several threads may wait on a live target; each woken joiner observes
/// the exit code and the last one frees the thread and releases the
/// identifier. A target that already exited can be reaped by exactly one
/// late joiner, and only if nobody was queued at exit time. `INVALID` for
/// the caller itself, a missing thread, or an already-consumed exit;
/// `DEADLOCK`/`NONE` propagate from the underlying sleep.
pub fn wait(tid: Tid) -> Result<i32, Error> {
    let _irq = IrqGuard::new();
    if tid < 0 || tid as usize >= MAX_THREADS || tid == current_id() {
        return Err(code::INVALID);
    }
    let Some(target) = get(tid) else {
        return Err(code::INVALID);
    };
    let t = unsafe { target.as_ref() };

    if t.state.get() != State::Zombie {
        sleep(unsafe { &(*target.as_ptr()).join_queue })?;
        debug_assert_eq!(t.state.get(), State::Zombie);

        let exit_code = t.exit_code.get();
        let remaining = t.reapers.get() - 1;
        t.reapers.set(remaining);
        if remaining == 0 {
            unsafe { destroy(target) };
        }
        Ok(exit_code)
    } else if t.late_waiter_succeed.get() {
        // Consume the slot before anything else so a second late joiner,
        // even one racing through the same masked window, reads false.
        t.late_waiter_succeed.set(false);
        let exit_code = t.exit_code.get();
        unsafe { destroy(target) };
        Ok(exit_code)
    } else {
        Err(code::INVALID)
    }
}

/// Free a fully-reaped zombie and release its identifier.
unsafe fn destroy(target: NonNull<Thread>) {
    let id;
    {
        let t = &mut *target.as_ptr();
        debug_assert_eq!(t.state.get(), State::Zombie);
        drop(t.stack.take());
        id = t.id;
    }
    *registry_slot(id as usize) = None;
    *id_free(id as usize) = true;
    drop(Box::from_raw(target.as_ptr()));
    log::trace!("thread {} reaped", id);
}

/// Walk the wait-for graph from `start`: each hop goes to the owner of the
/// queue the thread is blocked in. Reaching the caller means blocking would
/// close a cycle; an ownerless queue or a revisit of the root ends the walk.
fn wait_chain_reaches_current(start: NonNull<Thread>) -> bool {
    let me = current();
    let mut node = Some(start);
    while let Some(t) = node {
        if t == me {
            return true;
        }
        let Some(queue) = unsafe { t.as_ref() }.waiting_on.get() else {
            return false;
        };
        node = unsafe { queue.as_ref() }.owner_thread();
        if node == Some(start) {
            return false;
        }
    }
    false
}

/// Block the caller on `queue` and schedule another thread.
///
/// Must be called with interrupts masked. Fails with `DEADLOCK` when the
/// queue's owner chain leads back to the caller (checked before blocking,
/// so it wins over `NONE`), or with `NONE` when nothing else is runnable;
/// in both cases the caller is unchanged. On success, returns the
/// identifier run while the caller slept.
pub fn sleep(queue: &WaitQueue) -> Result<Tid, Error> {
    assert!(!irq::enabled(), "thread_sleep requires interrupts masked");

    if let Some(owner) = queue.owner_thread() {
        if wait_chain_reaches_current(owner) {
            return Err(code::DEADLOCK);
        }
    }

    let me = current();
    let t = unsafe { me.as_ref() };
    t.state.set(State::Blocked);
    queue.push(me).expect("wait queue at capacity");
    t.waiting_on.set(Some(NonNull::from(queue)));

    match yield_to(ANY) {
        Ok(next) => Ok(next),
        Err(err) => {
            // Nobody to run: undo the block and keep executing.
            queue.remove(t.id);
            t.state.set(State::Running);
            t.waiting_on.set(None);
            Err(err)
        }
    }
}

/// Move one (or all) threads from `queue` to the scheduler. Must be called
/// with interrupts masked. Woken threads become runnable; none of them runs
/// before the caller suspends. Returns how many were moved.
pub fn wakeup(queue: &WaitQueue, all: bool) -> usize {
    assert!(!irq::enabled(), "thread_wakeup requires interrupts masked");

    let mut count = 0;
    while let Some(node) = queue.pop() {
        let t = unsafe { node.as_ref() };
        assert_eq!(t.state.get(), State::Blocked);
        t.state.set(State::Runnable);
        t.waiting_on.set(None);
        scheduler::enqueue(node).expect("ready queue overflow");
        count += 1;
        if !all {
            break;
        }
    }
    count
}

/// Unload the registry. Callers guarantee every other thread is a zombie or
/// was already reaped; leftovers are swept here.
pub(crate) fn end() {
    let me = current();
    for id in 0..MAX_THREADS {
        let Some(t) = *registry_slot(id) else {
            continue;
        };
        if t == me {
            continue;
        }
        unsafe {
            let tr = &mut *t.as_ptr();
            while tr.join_queue.pop().is_some() {}
            tr.state.set(State::Zombie);
            destroy(t);
        }
    }
    unsafe {
        let tr = &mut *me.as_ptr();
        // Still executing on this stack when it is runtime-owned; leak it
        // rather than pull it out from under ourselves.
        if let Some(stack) = tr.stack.take() {
            core::mem::forget(stack);
        }
        while tr.join_queue.pop().is_some() {}
        *registry_slot(tr.id as usize) = None;
        *id_free(tr.id as usize) = true;
        *(&raw mut CURRENT) = None;
        *(&raw mut PREVIOUS) = None;
        drop(Box::from_raw(me.as_ptr()));
    }
}
