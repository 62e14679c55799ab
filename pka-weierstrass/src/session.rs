//! Curve session: engine ownership and the pinned descriptor registers.

use crate::curves::{CurveId, CurveParams};
use crate::point::AffinePoint;
use crate::Error;
use pka_engine::{PkaEngine, VirtReg};

/// Which modulus currently occupies the engine's modulus slot.
///
/// Installing a modulus recomputes its reduction tag, so the session
/// tracks the active one and skips redundant installs.
#[derive(Clone, Copy, Eq, PartialEq)]
pub(crate) enum ActiveModulus {
    None,
    Field,
    Order,
}

/// An open session against one named curve.
///
/// Owns the register engine for its lifetime; the curve constants occupy
/// the first six virtual registers and stay live until the session drops,
/// which tears the engine down and scrubs the bank.
pub struct CurveSession {
    pub(crate) engine: PkaEngine,
    pub(crate) params: &'static CurveParams,
    pub(crate) p: VirtReg,
    pub(crate) a: VirtReg,
    pub(crate) b: VirtReg,
    pub(crate) n: VirtReg,
    pub(crate) gx: VirtReg,
    pub(crate) gy: VirtReg,
    pub(crate) active: ActiveModulus,
}

impl CurveSession {
    /// Opens a session for a named curve, bringing up the engine,
    /// loading the curve descriptor and validating the base point.
    ///
    /// On return the order n occupies the modulus slot, the convention
    /// every other entry point assumes.
    pub fn open(id: CurveId) -> Result<Self, Error> {
        let params = CurveParams::get(id);
        let mut engine = PkaEngine::init(params.bits);
        let p = engine.alloc();
        let a = engine.alloc();
        let b = engine.alloc();
        let n = engine.alloc();
        let gx = engine.alloc();
        let gy = engine.alloc();
        engine.load_be(&p, params.p);
        engine.load_be(&a, params.a);
        engine.load_be(&b, params.b);
        engine.load_be(&n, params.n);
        engine.load_be(&gx, params.gx);
        engine.load_be(&gy, params.gy);
        let mut session = Self {
            engine,
            params,
            p,
            a,
            b,
            n,
            gx,
            gy,
            active: ActiveModulus::None,
        };
        let g = session.alloc_generator();
        let valid = session.validate_affine(&g);
        session.free_affine(g);
        valid?;
        session.use_order_modulus();
        Ok(session)
    }

    /// Closes the session. Dropping it is equivalent.
    pub fn close(self) {}

    /// Descriptor of the session's curve.
    pub fn params(&self) -> &'static CurveParams {
        self.params
    }

    /// Direct access to the underlying register engine, for staging
    /// scalars and coordinates in and out.
    pub fn engine(&mut self) -> &mut PkaEngine {
        &mut self.engine
    }

    /// Installs the field prime p as the engine modulus.
    pub fn use_field_modulus(&mut self) {
        if self.active != ActiveModulus::Field {
            let Self { engine, p, .. } = self;
            engine.set_modulus(p);
            self.active = ActiveModulus::Field;
        }
    }

    /// Installs the base-point order n as the engine modulus.
    pub fn use_order_modulus(&mut self) {
        if self.active != ActiveModulus::Order {
            let Self { engine, n, .. } = self;
            engine.set_modulus(n);
            self.active = ActiveModulus::Order;
        }
    }

    /// Whether `k` is a valid secret scalar, i.e. in `[1, n)`.
    pub fn is_scalar_in_range(&mut self, k: &VirtReg) -> bool {
        let Self { engine, n, .. } = self;
        !engine.is_zero(k) && engine.less_than(k, n)
    }

    /// `d = a mod n`.
    pub fn reduce_mod_order(&mut self, d: &VirtReg, a: &VirtReg) {
        self.use_order_modulus();
        self.engine.mod_reduce(d, a);
    }

    /// Compares the pinned descriptor registers against the compiled-in
    /// constants. A mismatch means the curve parameters were corrupted
    /// mid-computation, possibly by an induced fault.
    #[cfg(feature = "dfa")]
    pub(crate) fn constants_intact(&mut self) -> bool {
        let Self {
            engine,
            params,
            p,
            a,
            b,
            n,
            gx,
            gy,
            ..
        } = self;
        let golden = engine.alloc();
        let mut ok = true;
        let pairs = [
            (&*p, params.p),
            (&*a, params.a),
            (&*b, params.b),
            (&*n, params.n),
            (&*gx, params.gx),
            (&*gy, params.gy),
        ];
        for (reg, bytes) in pairs {
            engine.load_be(&golden, bytes);
            ok &= engine.eq(&golden, reg);
        }
        engine.free(golden);
        ok
    }

    /// Allocates an affine point holding the base point G.
    pub fn alloc_generator(&mut self) -> AffinePoint {
        let pt = self.alloc_affine();
        let Self { engine, gx, gy, .. } = self;
        engine.copy(&pt.x, gx);
        engine.copy(&pt.y, gy);
        pt
    }
}
