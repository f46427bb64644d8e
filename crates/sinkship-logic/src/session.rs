//! Ship session: the board wired to its storage and broadcast collaborators.
//!
//! This is the surface the turn sequencer calls. Every mutating call follows
//! the same order: change the board, save each affected tile through the
//! store, then hand notices to the notifier. Read-only queries go straight to
//! the board.

use crate::board::{Board, PlacementOption, ShipBounds};
use crate::config::RulesConfig;
use crate::error::Result;
use crate::explosion::ChainExplosion;
use crate::notify::{BoardNotice, NoticeKind, Notifier};
use crate::pathfinding;
use crate::persistence::TileStore;
use crate::tile::{TileDef, TileId};

pub struct ShipSession<S: TileStore, N: Notifier> {
    board: Board,
    store: S,
    notifier: N,
}

impl<S: TileStore, N: Notifier> ShipSession<S, N> {
    /// Load every stored row and rebuild the board. Corrupted rows fail the
    /// whole open.
    pub fn open(store: S, notifier: N, rules: RulesConfig) -> Result<Self> {
        let rows = store.load_all_tiles()?;
        let board = Board::hydrate(rows, rules)?;
        Ok(Self {
            board,
            store,
            notifier,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn into_parts(self) -> (Board, S, N) {
        (self.board, self.store, self.notifier)
    }

    fn save(&mut self, id: TileId) -> Result<()> {
        if let Some(tile) = self.board.tile(id) {
            self.store.save_tile(&tile.to_row())?;
        }
        Ok(())
    }

    fn announce(&mut self, id: TileId, kind: NoticeKind) {
        if let Some(tile) = self.board.tile(id) {
            self.notifier.notify(BoardNotice::for_tile(tile, kind));
        }
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Place the setup room at the origin.
    pub fn setup(&mut self, def: TileDef) -> Result<Option<TileId>> {
        let Some(id) = self.board.setup_starting_tile(def) else {
            return Ok(None);
        };
        self.save(id)?;
        self.announce(id, NoticeKind::Placed);
        Ok(Some(id))
    }

    /// Record a drawn tile that is not on the board yet. `Ok(None)` when
    /// the board has no ids left.
    pub fn draw_tile(&mut self, def: TileDef, draw_order: Option<i32>) -> Result<Option<TileId>> {
        let Some(id) = self.board.register_tile(def) else {
            return Ok(None);
        };
        if let Some(tile) = self.board.tile_mut(id) {
            tile.set_draw_order(draw_order);
        }
        self.save(id)?;
        Ok(Some(id))
    }

    /// Place a drawn tile. `Ok(false)` is an ordinary rejection. The tile
    /// row is saved either way, since placement applies the orientation
    /// before checking doors.
    pub fn place_tile(&mut self, id: TileId, x: i32, y: i32, orientation: i32) -> Result<bool> {
        let placed = self.board.place_tile(id, x, y, orientation);
        self.save(id)?;
        if placed {
            self.announce(id, NoticeKind::Placed);
        }
        Ok(placed)
    }

    /// Check, register and place a tile in one step.
    pub fn place_new(
        &mut self,
        def: TileDef,
        x: i32,
        y: i32,
        orientation: i32,
    ) -> Result<Option<TileId>> {
        let Some(id) = self.board.place_new(def, x, y, orientation) else {
            return Ok(None);
        };
        self.save(id)?;
        self.announce(id, NoticeKind::Placed);
        Ok(Some(id))
    }

    /// Set a tile's fire level. Returns the clamped level, or `None` for an
    /// unknown tile. Explosions are not triggered here.
    pub fn set_fire_level(&mut self, id: TileId, level: i32) -> Result<Option<u8>> {
        let Some(level) = self.board.set_fire_level(id, level) else {
            return Ok(None);
        };
        self.save(id)?;
        self.announce(id, NoticeKind::FireChanged);
        Ok(Some(level))
    }

    /// Run the chain explosion from `start`, save every tile it changed and
    /// announce each explosion.
    pub fn trigger_explosions(&mut self, start: TileId) -> Result<ChainExplosion> {
        let chain = self.board.handle_chain_explosions(start);
        for &id in &chain.touched {
            self.save(id)?;
        }
        for event in &chain.exploded {
            self.announce(event.tile_id, NoticeKind::Explosion(event.kind));
        }
        if self.board.is_critically_damaged() {
            log::info!(
                "Ship critically damaged: {} rooms exploded",
                self.board.critical_damage_count()
            );
        }
        Ok(chain)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn valid_placements(&self, def: &TileDef) -> Vec<PlacementOption> {
        self.board.valid_placement_positions(def)
    }

    pub fn find_path(&self, start: TileId, end: TileId) -> Vec<TileId> {
        pathfinding::find_path(&self.board, start, end)
    }

    pub fn is_critically_damaged(&self) -> bool {
        self.board.is_critically_damaged()
    }

    pub fn ship_bounds(&self) -> ShipBounds {
        self.board.ship_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SessionError, StoreError};
    use crate::explosion::ExplosionKind;
    use crate::notify::{NullNotifier, RecordingNotifier};
    use crate::persistence::{MemoryTileStore, TileRow};
    use crate::tile::{Direction, DoorMask, TileColor};

    fn corridor() -> TileDef {
        TileDef::room(
            TileColor::Red,
            2,
            DoorMask::from_directions(&[Direction::West, Direction::East]),
        )
    }

    fn new_session() -> ShipSession<MemoryTileStore, RecordingNotifier> {
        ShipSession::open(
            MemoryTileStore::new(),
            RecordingNotifier::new(),
            RulesConfig::default(),
        )
        .unwrap()
    }

    /// Accepts loads, refuses every write.
    struct ReadOnlyStore;

    impl TileStore for ReadOnlyStore {
        fn load_all_tiles(&self) -> std::result::Result<Vec<TileRow>, StoreError> {
            Ok(Vec::new())
        }
        fn save_tile(&mut self, _row: &TileRow) -> std::result::Result<(), StoreError> {
            Err(StoreError::Backend("read-only".into()))
        }
    }

    #[test]
    fn test_setup_saves_and_announces() {
        let mut session = new_session();
        let start = session
            .setup(TileDef::starting(DoorMask::ALL))
            .unwrap()
            .unwrap();
        assert!(session.store().row(start).is_some());
        assert_eq!(session.notifier().notices.len(), 1);
        assert_eq!(session.notifier().notices[0].kind, NoticeKind::Placed);
        assert_eq!(session.setup(TileDef::starting(DoorMask::ALL)).unwrap(), None);
    }

    #[test]
    fn test_draw_then_place() {
        let mut session = new_session();
        session.setup(TileDef::starting(DoorMask::ALL)).unwrap();
        let drawn = session.draw_tile(corridor(), Some(3)).unwrap().unwrap();
        let row = session.store().row(drawn).unwrap().clone();
        assert_eq!(row.x, None);
        assert_eq!(row.draw_order, Some(3));

        // Turned 90° the corridor runs N/S, so its west wall meets the
        // start's east door.
        assert!(!session.place_tile(drawn, 1, 0, 90).unwrap());
        assert_eq!(session.store().row(drawn).unwrap().orientation, 90);
        assert!(session.place_tile(drawn, 1, 0, 0).unwrap());
        let row = session.store().row(drawn).unwrap();
        assert_eq!((row.x, row.y), (Some(1), Some(0)));
        assert_eq!(row.draw_order, Some(3));
        assert_eq!(session.notifier().notices.len(), 2);
    }

    #[test]
    fn test_trigger_saves_touched_tiles() {
        let mut session = new_session();
        let start = session
            .setup(TileDef::starting(DoorMask::ALL))
            .unwrap()
            .unwrap();
        let keg = session
            .place_new(corridor().with_powder_keg(), 1, 0, 0)
            .unwrap()
            .unwrap();
        session.set_fire_level(keg, 1).unwrap();
        session.notifier_mut().drain();

        let chain = session.trigger_explosions(keg).unwrap();
        assert_eq!(chain.exploded.len(), 1);
        let keg_row = session.store().row(keg).unwrap();
        assert!(keg_row.powder_keg_exploded);
        assert_eq!(keg_row.fire_level, 6);
        assert_eq!(session.store().row(start).unwrap().fire_level, 1);

        let notices = &session.notifier().notices;
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0].kind,
            NoticeKind::Explosion(ExplosionKind::PowderKeg)
        );
        assert_eq!(notices[0].fire_level, 6);
    }

    #[test]
    fn test_reopen_restores_board() {
        let mut session = new_session();
        let start = session
            .setup(TileDef::starting(DoorMask::ALL))
            .unwrap()
            .unwrap();
        let east = session.place_new(corridor(), 1, 0, 0).unwrap().unwrap();
        session.set_fire_level(east, 4).unwrap();
        let (board, store, _) = session.into_parts();

        let reopened =
            ShipSession::open(store, NullNotifier, RulesConfig::default()).unwrap();
        assert_eq!(reopened.board().to_rows(), board.to_rows());
        assert_eq!(reopened.find_path(start, east), vec![start, east]);
        assert_eq!(reopened.board().tile(east).unwrap().fire_level(), 4);
    }

    #[test]
    fn test_open_rejects_corrupted_rows() {
        let mut board = Board::new();
        board.setup_starting_tile(TileDef::starting(DoorMask::ALL));
        let mut rows = board.to_rows();
        rows[0].doors = 0b0001;
        let result = ShipSession::open(
            MemoryTileStore::with_rows(rows),
            NullNotifier,
            RulesConfig::default(),
        );
        assert!(matches!(result, Err(SessionError::Board(_))));
    }

    #[test]
    fn test_store_failure_surfaces() {
        let mut session =
            ShipSession::open(ReadOnlyStore, NullNotifier, RulesConfig::default()).unwrap();
        let err = session.setup(TileDef::starting(DoorMask::ALL)).unwrap_err();
        assert!(matches!(err, SessionError::Store(StoreError::Backend(_))));
    }

    #[test]
    fn test_unknown_tile_fire_is_none() {
        let mut session = new_session();
        assert_eq!(session.set_fire_level(77, 3).unwrap(), None);
        assert!(session.store().is_empty());
    }
}
