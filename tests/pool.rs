use std::cell::RefCell;

use slpool::{
  BLOCK_SIZE, BestFitPool, PoolConfig, PoolError, SearchMode, Segment, SlPool, StoragePool,
  allocate_tagged, release_tagged,
};

fn bytes(blocks: usize) -> usize {
  blocks * BLOCK_SIZE
}

/// A pool whose free runs are 5, 2 and 5 blocks long, in that address order.
fn five_two_five() -> SlPool {
  let mut pool = SlPool::new(bytes(14)).unwrap();
  let ptrs: Vec<_> = [5, 1, 2, 1, 5]
    .iter()
    .map(|&n| pool.allocate(bytes(n)).unwrap())
    .collect();

  for i in [0, 2, 4] {
    pool.free(ptrs[i]).unwrap();
  }

  assert_eq!(pool.free_runs().collect::<Vec<_>>(), vec![(0, 5), (6, 2), (9, 5)]);

  pool
}

#[test]
fn first_fit_takes_lowest_run_and_splits_it() {
  let mut pool = five_two_five();
  let base = pool.view();
  let ptr = pool.allocate(bytes(2)).unwrap();

  assert_eq!(pool.free_runs().collect::<Vec<_>>(), vec![(2, 3), (6, 2), (9, 5)]);
  assert_eq!(base.free_blocks() - 2, pool.free_blocks());

  pool.free(ptr).unwrap();
  assert_eq!(pool.view(), base);
}

#[test]
fn best_fit_takes_exact_run_without_splitting() {
  let mut pool = five_two_five();

  pool.allocate_bf(bytes(2)).unwrap();

  assert_eq!(pool.free_runs().collect::<Vec<_>>(), vec![(0, 5), (9, 5)]);
}

#[test]
fn coalescing_is_independent_of_release_order() {
  let orders = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
  ];

  for order in orders {
    let mut pool = SlPool::new(bytes(7)).unwrap();
    let ptrs = [2, 3, 2].map(|n| pool.allocate(bytes(n)).unwrap());

    assert_eq!(pool.free_blocks(), 0);

    for i in order {
      pool.free(ptrs[i]).unwrap();
    }

    assert_eq!(pool.view().segments(), &[Segment::Free(7)], "order {order:?}");
  }
}

#[test]
fn per_pool_search_mode_drives_the_trait() {
  let config = PoolConfig::new(bytes(14)).search_mode(SearchMode::BestFit);
  let mut pool = SlPool::with_config(config).unwrap();
  let ptrs: Vec<_> = [5, 1, 2, 1, 5]
    .iter()
    .map(|&n| pool.allocate(bytes(n)).unwrap())
    .collect();

  for i in [0, 2, 4] {
    pool.free(ptrs[i]).unwrap();
  }

  let as_trait: &mut dyn BestFitPool = &mut pool;
  assert_eq!(as_trait.allocate(bytes(2)), Ok(ptrs[2]));
  assert_eq!(as_trait.allocate_bf(bytes(5)), Ok(ptrs[0]));
  assert_eq!(as_trait.view().free_blocks(), 5);
}

#[test]
fn out_of_memory_falls_back_to_the_system() {
  let small = RefCell::new(SlPool::new(bytes(2)).unwrap());
  let request = bytes(4);

  let ptr = match allocate_tagged(request, Some(&small)) {
    Err(PoolError::OutOfMemory { .. }) => allocate_tagged(request, None).unwrap(),
    other => panic!("expected the pool to be exhausted, got {other:?}"),
  };

  unsafe {
    ptr.as_ptr().write_bytes(0x5a, request);
    release_tagged(ptr).unwrap();
  }

  assert_eq!(small.borrow().free_blocks(), 2);
}

#[test]
fn pools_are_interchangeable_behind_the_trait() {
  let pools: Vec<Box<dyn StoragePool>> = vec![
    Box::new(SlPool::new(bytes(8)).unwrap()),
    Box::new(
      SlPool::with_config(PoolConfig::new(bytes(8)).search_mode(SearchMode::BestFit)).unwrap(),
    ),
  ];

  for mut pool in pools {
    let a = pool.allocate(1).unwrap();
    let b = pool.allocate(bytes(3)).unwrap();

    assert_eq!(
      pool.view().segments(),
      &[Segment::Used(1), Segment::Used(3), Segment::Free(4)]
    );

    pool.free(a).unwrap();
    pool.free(b).unwrap();

    assert_eq!(pool.view().to_string(), "[ ++++++++ ] \n+[8] || Total blocks: 8\n");
  }
}
